use chrono::{Duration, NaiveDate};

use crate::models::{CycleInput, CyclePhase, CyclePrediction, FertileWindow, FertilitySign, PhaseGuidance};

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;
const BASE_FERTILITY_SCORE: i32 = 80;
const LUTEAL_PHASE_DAYS: i64 = 14;
const FERTILE_MARGIN_DAYS: i64 = 2;

/// Predict period, ovulation and fertile window dates from the reported cycle.
/// Missing or zero lengths fall back to a 28 day cycle and a 5 day period.
pub fn predict(input: &CycleInput) -> CyclePrediction {
    let cycle_length = input
        .cycle_length
        .filter(|&n| n != 0)
        .unwrap_or(DEFAULT_CYCLE_LENGTH);
    let period_length = input
        .period_length
        .filter(|&n| n != 0)
        .unwrap_or(DEFAULT_PERIOD_LENGTH);

    let start = input.last_period_date;
    let ovulation_day = start + Duration::days(cycle_length - LUTEAL_PHASE_DAYS);

    CyclePrediction {
        period_start: start,
        period_end: start + Duration::days(period_length - 1),
        period_length,
        next_period: start + Duration::days(cycle_length),
        ovulation_day,
        fertile_window: FertileWindow {
            start: ovulation_day - Duration::days(FERTILE_MARGIN_DAYS),
            end: ovulation_day + Duration::days(FERTILE_MARGIN_DAYS),
        },
        fertility_score: fertility_score(&input.symptoms),
    }
}

/// Base score adjusted by every recognised sign, clamped to 0..=100.
/// Duplicates count once per occurrence.
pub fn fertility_score<S: AsRef<str>>(symptoms: &[S]) -> i32 {
    let adjustment: i32 = symptoms
        .iter()
        .filter_map(|s| FertilitySign::from_tag(s.as_ref()))
        .map(FertilitySign::weight)
        .sum();

    (BASE_FERTILITY_SCORE + adjustment).clamp(0, 100)
}

/// 1-based day within the cycle that contains `today`.
pub fn cycle_day(start: NaiveDate, cycle_length: i64, today: NaiveDate) -> i64 {
    let cycle_length = if cycle_length > 0 { cycle_length } else { DEFAULT_CYCLE_LENGTH };
    (today - start).num_days().rem_euclid(cycle_length) + 1
}

pub fn phase_guidance(cycle_day: i64) -> PhaseGuidance {
    match cycle_day {
        ..=5 => PhaseGuidance {
            phase: CyclePhase::Menstrual,
            common_symptoms: vec!["cramps", "fatigue", "lower back pain", "headache", "mood swings"],
            recommendations: vec![
                "Stay hydrated",
                "Use a warm pad for cramps",
                "Increase iron-rich foods (spinach, beans, fish)",
                "Light stretching or yoga",
                "Rest as needed",
            ],
        },
        6..=13 => PhaseGuidance {
            phase: CyclePhase::Follicular,
            common_symptoms: vec!["increased energy", "clearer mood", "light spotting (sometimes)"],
            recommendations: vec![
                "Start moderate exercise",
                "Good time for planning and productivity",
                "Eat protein + healthy fats",
                "Stay consistent with sleep",
            ],
        },
        14..=16 => PhaseGuidance {
            phase: CyclePhase::Ovulation,
            common_symptoms: vec![
                "increased libido",
                "clear stretchy cervical mucus",
                "light pelvic pain (mittelschmerz)",
                "increased energy",
            ],
            recommendations: vec![
                "Best time for conception",
                "Stay hydrated",
                "Healthy meals (fruits, vegetables, lean protein)",
                "Avoid heavy stress",
            ],
        },
        _ => PhaseGuidance {
            phase: CyclePhase::Luteal,
            common_symptoms: vec![
                "bloating",
                "breast tenderness",
                "fatigue",
                "irritability",
                "food cravings",
                "mild cramps",
            ],
            recommendations: vec![
                "Reduce sugar + caffeine",
                "Magnesium-rich foods for mood and cramps",
                "Light exercise helps with PMS",
                "Stay hydrated",
                "Get enough sleep",
            ],
        },
    }
}
