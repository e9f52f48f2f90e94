use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::insights::InsightKey;
use crate::models::{
    Cycle, CyclePrediction, FertileWindow, Language, OtpRecord, PendingUser, StoredInsight, Symptom,
    User, UserProfile,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    hashed_password: String,
    role: String,
    phone_number: String,
    is_verified: bool,
    language_preference: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            hashed_password: row.hashed_password,
            role: row.role,
            phone_number: row.phone_number,
            is_verified: row.is_verified,
            language_preference: Language::from_code(&row.language_preference).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PendingRow {
    phone_number: String,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    hashed_password: String,
    role: String,
    language_preference: String,
    expires_at: DateTime<Utc>,
}

impl From<PendingRow> for PendingUser {
    fn from(row: PendingRow) -> Self {
        PendingUser {
            phone_number: row.phone_number,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            hashed_password: row.hashed_password,
            role: row.role,
            language_preference: Language::from_code(&row.language_preference).unwrap_or_default(),
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    id: Uuid,
    verification_id: Uuid,
    phone: String,
    otp_hashed: String,
    attempts: i32,
    is_used: bool,
    expires_at: DateTime<Utc>,
}

impl From<OtpRow> for OtpRecord {
    fn from(row: OtpRow) -> Self {
        OtpRecord {
            id: row.id,
            verification_id: row.verification_id,
            phone: row.phone,
            otp_hashed: row.otp_hashed,
            attempts: row.attempts,
            is_used: row.is_used,
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    age: Option<i32>,
    cycle_length: Option<i32>,
    last_period_date: Option<NaiveDate>,
    ttc_history: Option<String>,
    faith_preference: Option<String>,
    audio_preference: Option<bool>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            user_id: row.user_id,
            age: row.age,
            cycle_length: row.cycle_length,
            last_period_date: row.last_period_date,
            ttc_history: row.ttc_history,
            faith_preference: row.faith_preference,
            audio_preference: row.audio_preference,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CycleRow {
    id: Uuid,
    user_id: Uuid,
    start_date: NaiveDate,
    cycle_length: i32,
    period_length: i32,
    symptoms: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<CycleRow> for Cycle {
    fn from(row: CycleRow) -> Self {
        Cycle {
            id: row.id,
            user_id: row.user_id,
            start_date: row.start_date,
            cycle_length: row.cycle_length,
            period_length: row.period_length,
            symptoms: row.symptoms.iter().filter_map(|s| Symptom::from_tag(s)).collect(),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InsightRow {
    user_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    period_length: i32,
    next_period: NaiveDate,
    ovulation_day: NaiveDate,
    fertile_period_start: NaiveDate,
    fertile_period_end: NaiveDate,
    fertility_score: i32,
    symptoms: Vec<String>,
    insight_key: String,
    insight_text: String,
    updated_at: DateTime<Utc>,
}

impl From<InsightRow> for StoredInsight {
    fn from(row: InsightRow) -> Self {
        StoredInsight {
            user_id: row.user_id,
            prediction: CyclePrediction {
                period_start: row.period_start,
                period_end: row.period_end,
                period_length: i64::from(row.period_length),
                next_period: row.next_period,
                ovulation_day: row.ovulation_day,
                fertile_window: FertileWindow {
                    start: row.fertile_period_start,
                    end: row.fertile_period_end,
                },
                fertility_score: row.fertility_score,
            },
            symptoms: row.symptoms,
            insight_key: InsightKey::from_name(&row.insight_key).unwrap_or(InsightKey::Default),
            insight_text: row.insight_text,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, hashed_password, role, \
                            phone_number, is_verified, language_preference, created_at";

const CYCLE_COLUMNS: &str = "id, user_id, start_date, cycle_length, period_length, symptoms, created_at";

#[async_trait]
impl Store for PgStore {
    async fn email_or_username_taken(&self, email: &str, username: &str) -> AppResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 OR username = $2",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn start_registration(&self, pending: PendingUser, otp: OtpRecord) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM otps WHERE phone = $1 AND is_used = FALSE")
            .bind(&otp.phone)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM pending_users WHERE phone_number = $1")
            .bind(&pending.phone_number)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO otps (id, verification_id, phone, otp_hashed, attempts, is_used, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(otp.id)
        .bind(otp.verification_id)
        .bind(&otp.phone)
        .bind(&otp.otp_hashed)
        .bind(otp.attempts)
        .bind(otp.is_used)
        .bind(otp.expires_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO pending_users (phone_number, email, username, first_name, last_name, \
             hashed_password, role, language_preference, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&pending.phone_number)
        .bind(&pending.email)
        .bind(&pending.username)
        .bind(&pending.first_name)
        .bind(&pending.last_name)
        .bind(&pending.hashed_password)
        .bind(&pending.role)
        .bind(pending.language_preference.code())
        .bind(pending.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_active_otp(&self, verification_id: Uuid) -> AppResult<Option<OtpRecord>> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT id, verification_id, phone, otp_hashed, attempts, is_used, expires_at \
             FROM otps WHERE verification_id = $1 AND is_used = FALSE \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(verification_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(OtpRecord::from))
    }

    async fn record_failed_attempt(&self, otp_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE otps SET attempts = attempts + 1 WHERE id = $1")
            .bind(otp_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete_registration(&self, otp_id: Uuid, phone: &str) -> AppResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, PendingRow>(
            "SELECT phone_number, email, username, first_name, last_name, hashed_password, \
             role, language_preference, expires_at FROM pending_users WHERE phone_number = $1 FOR UPDATE",
        )
        .bind(phone)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(pending) = pending else {
            return Ok(None);
        };

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 OR username = $2",
        )
        .bind(&pending.email)
        .bind(&pending.username)
        .fetch_one(&mut *tx)
        .await?;
        if taken > 0 {
            return Err(AppError::Conflict("Email or username already exists".into()));
        }

        let user = PendingUser::from(pending).into_verified_user();
        sqlx::query(
            "INSERT INTO users (id, email, username, first_name, last_name, hashed_password, role, \
             phone_number, is_verified, language_preference, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.hashed_password)
        .bind(&user.role)
        .bind(&user.phone_number)
        .bind(user.is_verified)
        .bind(user.language_preference.code())
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            // a concurrent registration committed the same email or username first
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email or username already exists".into())
            }
            other => AppError::Database(other),
        })?;

        sqlx::query("UPDATE otps SET is_used = TRUE WHERE id = $1")
            .bind(otp_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM pending_users WHERE phone_number = $1")
            .bind(phone)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user))
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, age, cycle_length, last_period_date, ttc_history, faith_preference, \
             audio_preference FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn upsert_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, age, cycle_length, last_period_date, ttc_history, \
             faith_preference, audio_preference) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id) DO UPDATE SET age = EXCLUDED.age, \
             cycle_length = EXCLUDED.cycle_length, last_period_date = EXCLUDED.last_period_date, \
             ttc_history = EXCLUDED.ttc_history, faith_preference = EXCLUDED.faith_preference, \
             audio_preference = EXCLUDED.audio_preference",
        )
        .bind(profile.user_id)
        .bind(profile.age)
        .bind(profile.cycle_length)
        .bind(profile.last_period_date)
        .bind(&profile.ttc_history)
        .bind(&profile.faith_preference)
        .bind(profile.audio_preference)
        .execute(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_cycle(&self, cycle: Cycle) -> AppResult<Cycle> {
        let symptoms: Vec<String> = cycle.symptoms.iter().map(|s| s.as_str().to_string()).collect();
        sqlx::query(
            "INSERT INTO cycles (id, user_id, start_date, cycle_length, period_length, symptoms, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(cycle.id)
        .bind(cycle.user_id)
        .bind(cycle.start_date)
        .bind(cycle.cycle_length)
        .bind(cycle.period_length)
        .bind(&symptoms)
        .bind(cycle.created_at)
        .execute(&self.pool)
        .await?;
        Ok(cycle)
    }

    async fn list_cycles(&self, user_id: Uuid) -> AppResult<Vec<Cycle>> {
        let rows = sqlx::query_as::<_, CycleRow>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE user_id = $1 ORDER BY start_date ASC, created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Cycle::from).collect())
    }

    async fn latest_cycle(&self, user_id: Uuid) -> AppResult<Option<Cycle>> {
        let row = sqlx::query_as::<_, CycleRow>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE user_id = $1 \
             ORDER BY start_date DESC, created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Cycle::from))
    }

    async fn upsert_insight(&self, insight: StoredInsight) -> AppResult<()> {
        let p = &insight.prediction;
        sqlx::query(
            "INSERT INTO insights (user_id, period_start, period_end, period_length, next_period, \
             ovulation_day, fertile_period_start, fertile_period_end, fertility_score, symptoms, \
             insight_key, insight_text, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (user_id) DO UPDATE SET period_start = EXCLUDED.period_start, \
             period_end = EXCLUDED.period_end, period_length = EXCLUDED.period_length, \
             next_period = EXCLUDED.next_period, ovulation_day = EXCLUDED.ovulation_day, \
             fertile_period_start = EXCLUDED.fertile_period_start, \
             fertile_period_end = EXCLUDED.fertile_period_end, \
             fertility_score = EXCLUDED.fertility_score, symptoms = EXCLUDED.symptoms, \
             insight_key = EXCLUDED.insight_key, insight_text = EXCLUDED.insight_text, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(insight.user_id)
        .bind(p.period_start)
        .bind(p.period_end)
        .bind(p.period_length as i32)
        .bind(p.next_period)
        .bind(p.ovulation_day)
        .bind(p.fertile_window.start)
        .bind(p.fertile_window.end)
        .bind(p.fertility_score)
        .bind(&insight.symptoms)
        .bind(insight.insight_key.as_str())
        .bind(&insight.insight_text)
        .bind(insight.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_insight(&self, user_id: Uuid) -> AppResult<Option<StoredInsight>> {
        let row = sqlx::query_as::<_, InsightRow>(
            "SELECT user_id, period_start, period_end, period_length, next_period, ovulation_day, \
             fertile_period_start, fertile_period_end, fertility_score, symptoms, insight_key, \
             insight_text, updated_at FROM insights WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredInsight::from))
    }
}
