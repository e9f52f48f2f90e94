use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{NaiveDate, DateTime, Utc};
use validator::{Validate, ValidationError};

use crate::insights::InsightKey;

/// Locale codes a user can pick at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Yo,
    Ig,
    Ha,
    Pg,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Yo => "yo",
            Language::Ig => "ig",
            Language::Ha => "ha",
            Language::Pg => "pg",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "en" => Some(Language::En),
            "yo" => Some(Language::Yo),
            "ig" => Some(Language::Ig),
            "ha" => Some(Language::Ha),
            "pg" => Some(Language::Pg),
            _ => None,
        }
    }
}

/// Symptoms a user can log against a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Headache,
    Nausea,
    Cramps,
    Fatigue,
    BreastTenderness,
    Acne,
}

impl Symptom {
    pub fn as_str(self) -> &'static str {
        match self {
            Symptom::Headache => "headache",
            Symptom::Nausea => "nausea",
            Symptom::Cramps => "cramps",
            Symptom::Fatigue => "fatigue",
            Symptom::BreastTenderness => "breast_tenderness",
            Symptom::Acne => "acne",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "headache" => Some(Symptom::Headache),
            "nausea" => Some(Symptom::Nausea),
            "cramps" => Some(Symptom::Cramps),
            "fatigue" => Some(Symptom::Fatigue),
            "breast_tenderness" => Some(Symptom::BreastTenderness),
            "acne" => Some(Symptom::Acne),
            _ => None,
        }
    }

    /// The scoring sign this logged symptom counts as, if any.
    /// Period cramps are not ovulation cramps, so only headache and fatigue carry over.
    pub fn fertility_sign(self) -> Option<FertilitySign> {
        match self {
            Symptom::Headache => Some(FertilitySign::Headache),
            Symptom::Fatigue => Some(FertilitySign::Fatigue),
            Symptom::Nausea | Symptom::Cramps | Symptom::BreastTenderness | Symptom::Acne => None,
        }
    }
}

/// Body signs that move the fertility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FertilitySign {
    EggWhiteMucus,
    OvulationCramps,
    HighLibido,
    SoftCervix,
    Fatigue,
    Bloating,
    Headache,
    BackPain,
}

impl FertilitySign {
    pub const ALL: [FertilitySign; 8] = [
        FertilitySign::EggWhiteMucus,
        FertilitySign::OvulationCramps,
        FertilitySign::HighLibido,
        FertilitySign::SoftCervix,
        FertilitySign::Fatigue,
        FertilitySign::Bloating,
        FertilitySign::Headache,
        FertilitySign::BackPain,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            FertilitySign::EggWhiteMucus => "egg_white_mucus",
            FertilitySign::OvulationCramps => "ovulation_cramps",
            FertilitySign::HighLibido => "high_libido",
            FertilitySign::SoftCervix => "soft_cervix",
            FertilitySign::Fatigue => "fatigue",
            FertilitySign::Bloating => "bloating",
            FertilitySign::Headache => "headache",
            FertilitySign::BackPain => "back_pain",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tag() == tag)
    }

    /// Signed contribution to the fertility score.
    pub fn weight(self) -> i32 {
        match self {
            FertilitySign::EggWhiteMucus => 15,
            FertilitySign::OvulationCramps => 10,
            FertilitySign::HighLibido => 8,
            FertilitySign::SoftCervix => 7,
            FertilitySign::Fatigue => -5,
            FertilitySign::Bloating => -4,
            FertilitySign::Headache => -3,
            FertilitySign::BackPain => -4,
        }
    }
}

/// What the user reports about their cycle.
#[derive(Debug, Clone)]
pub struct CycleInput {
    pub last_period_date: NaiveDate,
    pub cycle_length: Option<i64>,
    pub period_length: Option<i64>,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertileWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FertileWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        (self.start..=self.end).contains(&day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePrediction {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub period_length: i64,
    pub next_period: NaiveDate,
    pub ovulation_day: NaiveDate,
    pub fertile_window: FertileWindow,
    pub fertility_score: i32,
}

/// Last computed insight for a user. One per user, overwritten on every computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInsight {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub prediction: CyclePrediction,
    pub symptoms: Vec<String>,
    pub insight_key: InsightKey,
    pub insight_text: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: String,
    pub phone_number: String,
    pub is_verified: bool,
    pub language_preference: Language,
    pub created_at: DateTime<Utc>,
}

/// Registration data held until the phone number is verified.
#[derive(Debug, Clone)]
pub struct PendingUser {
    pub phone_number: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
    pub role: String,
    pub language_preference: Language,
    pub expires_at: DateTime<Utc>,
}

impl PendingUser {
    pub fn into_verified_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            hashed_password: self.hashed_password,
            role: self.role,
            phone_number: self.phone_number,
            is_verified: true,
            language_preference: self.language_preference,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: Uuid,
    pub verification_id: Uuid,
    pub phone: String,
    pub otp_hashed: String,
    pub attempts: i32,
    pub is_used: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub age: Option<i32>,
    pub cycle_length: Option<i32>,
    pub last_period_date: Option<NaiveDate>,
    pub ttc_history: Option<String>,
    pub faith_preference: Option<String>,
    pub audio_preference: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cycle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub cycle_length: i32,
    pub period_length: i32,
    pub symptoms: Vec<Symptom>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CycleSummary {
    pub cycle_day: i64,
    pub in_fertile_window: bool,
    pub period_expected_in_days: i64,
    pub start_date: NaiveDate,
    pub guidance: PhaseGuidance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseGuidance {
    pub phase: CyclePhase,
    pub common_symptoms: Vec<&'static str>,
    pub recommendations: Vec<&'static str>,
}

// Request bodies

/// Earliest and latest period dates accepted from clients. Keeps every
/// predicted date well inside the calendar range chrono can represent.
pub const MIN_PERIOD_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => NaiveDate::MIN,
};
pub const MAX_PERIOD_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2199, 12, 31) {
    Some(d) => d,
    None => NaiveDate::MAX,
};

fn validate_period_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if (MIN_PERIOD_DATE..=MAX_PERIOD_DATE).contains(date) {
        return Ok(());
    }
    let mut err = ValidationError::new("date_range");
    err.message = Some("last_period_date must be between 1900-01-01 and 2199-12-31".into());
    Err(err)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 40))]
    pub username: String,
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(length(min = 8, max = 60))]
    pub password: String,
    pub role: String,
    #[validate(length(min = 1))]
    pub phone_number: String,
    #[serde(default)]
    pub language_preference: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub verification_id: Uuid,
    pub otp_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserProfileRequest {
    #[validate(range(min = 0, max = 120))]
    pub age: i32,
    #[validate(range(min = 21, max = 32))]
    pub cycle_length: i32,
    #[validate(custom = "validate_period_date")]
    pub last_period_date: NaiveDate,
    pub ttc_history: Option<String>,
    pub faith_preference: String,
    pub audio_preference: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CycleRequest {
    #[validate(custom = "validate_period_date")]
    pub last_period_date: NaiveDate,
    #[validate(range(min = 21, max = 32))]
    pub cycle_length: i64,
    #[validate(range(min = 2, max = 10))]
    pub period_length: i64,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InsightsRequest {
    #[validate(custom = "validate_period_date")]
    pub last_period_date: NaiveDate,
    #[validate(range(min = 21, max = 32))]
    pub cycle_length: Option<i64>,
    #[validate(range(min = 2, max = 10))]
    pub period_length: Option<i64>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

// Response bodies

#[derive(Serialize)]
pub struct InsightResponse {
    #[serde(flatten)]
    pub prediction: CyclePrediction,
    pub insight_key: InsightKey,
    pub insight_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub reply: String,
}

#[derive(Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}
