use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where today sits in the cycle. Only `OvulationDay`, `FertileWindow`,
/// `HighFertility` and `Default` are produced by [`derive_key`]; the rest
/// have translations but no rule selects them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightKey {
    OvulationDay,
    FertileWindow,
    HighFertility,
    LowFertility,
    PostOvulation,
    PeriodExpected,
    PeriodDay,
    CycleNormal,
    Default,
}

impl InsightKey {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightKey::OvulationDay => "OVULATION_DAY",
            InsightKey::FertileWindow => "FERTILE_WINDOW",
            InsightKey::HighFertility => "HIGH_FERTILITY",
            InsightKey::LowFertility => "LOW_FERTILITY",
            InsightKey::PostOvulation => "POST_OVULATION",
            InsightKey::PeriodExpected => "PERIOD_EXPECTED",
            InsightKey::PeriodDay => "PERIOD_DAY",
            InsightKey::CycleNormal => "CYCLE_NORMAL",
            InsightKey::Default => "DEFAULT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            InsightKey::OvulationDay,
            InsightKey::FertileWindow,
            InsightKey::HighFertility,
            InsightKey::LowFertility,
            InsightKey::PostOvulation,
            InsightKey::PeriodExpected,
            InsightKey::PeriodDay,
            InsightKey::CycleNormal,
            InsightKey::Default,
        ]
        .into_iter()
        .find(|k| k.as_str() == name)
    }
}

impl fmt::Display for InsightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const HIGH_FERTILITY_THRESHOLD: i32 = 75;

/// First match wins: ovulation day, then fertile window, then a high score.
pub fn derive_key(
    today: NaiveDate,
    ovulation_day: NaiveDate,
    fertile_start: NaiveDate,
    fertile_end: NaiveDate,
    fertility_score: i32,
) -> InsightKey {
    if today == ovulation_day {
        InsightKey::OvulationDay
    } else if fertile_start <= today && today <= fertile_end {
        InsightKey::FertileWindow
    } else if fertility_score >= HIGH_FERTILITY_THRESHOLD {
        InsightKey::HighFertility
    } else {
        InsightKey::Default
    }
}
