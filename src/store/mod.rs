//! Record storage behind a trait so handlers run against Postgres or memory.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Cycle, OtpRecord, PendingUser, StoredInsight, User, UserProfile};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn email_or_username_taken(&self, email: &str, username: &str) -> AppResult<bool>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Removes the user with their profile, cycles and insight.
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    /// Replaces any unused OTPs and pending registrations for the same phone.
    async fn start_registration(&self, pending: PendingUser, otp: OtpRecord) -> AppResult<()>;
    /// Latest unused OTP for the verification id.
    async fn find_active_otp(&self, verification_id: Uuid) -> AppResult<Option<OtpRecord>>;
    async fn record_failed_attempt(&self, otp_id: Uuid) -> AppResult<()>;
    /// Turns the pending registration for `phone` into a verified user and
    /// marks the OTP used, all or nothing. `Conflict` if the email or
    /// username was claimed meanwhile; the OTP then stays usable.
    async fn complete_registration(&self, otp_id: Uuid, phone: &str) -> AppResult<Option<User>>;

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
    async fn upsert_profile(&self, profile: UserProfile) -> AppResult<UserProfile>;

    async fn insert_cycle(&self, cycle: Cycle) -> AppResult<Cycle>;
    /// Oldest first.
    async fn list_cycles(&self, user_id: Uuid) -> AppResult<Vec<Cycle>>;
    async fn latest_cycle(&self, user_id: Uuid) -> AppResult<Option<Cycle>>;

    async fn upsert_insight(&self, insight: StoredInsight) -> AppResult<()>;
    async fn get_insight(&self, user_id: Uuid) -> AppResult<Option<StoredInsight>>;
}
