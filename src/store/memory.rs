use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::{Cycle, OtpRecord, PendingUser, StoredInsight, User, UserProfile};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    pending: HashMap<String, PendingUser>,
    otps: Vec<OtpRecord>,
    profiles: HashMap<Uuid, UserProfile>,
    cycles: Vec<Cycle>,
    insights: HashMap<Uuid, StoredInsight>,
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn email_or_username_taken(&self, email: &str, username: &str) -> bool {
        self.users.values().any(|u| u.email == email || u.username == username)
    }

    fn insert_unique_user(&mut self, user: User) -> AppResult<User> {
        if self.email_or_username_taken(&user.email, &user.username) {
            return Err(AppError::Conflict("Email or username already exists".into()));
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn email_or_username_taken(&self, email: &str, username: &str) -> AppResult<bool> {
        Ok(self.tables.read().await.email_or_username_taken(email, username))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.users.remove(&id).is_some();
        t.profiles.remove(&id);
        t.insights.remove(&id);
        t.cycles.retain(|c| c.user_id != id);
        Ok(removed)
    }

    async fn start_registration(&self, pending: PendingUser, otp: OtpRecord) -> AppResult<()> {
        let mut t = self.tables.write().await;
        t.otps.retain(|o| o.phone != otp.phone || o.is_used);
        t.pending.insert(pending.phone_number.clone(), pending);
        t.otps.push(otp);
        Ok(())
    }

    async fn find_active_otp(&self, verification_id: Uuid) -> AppResult<Option<OtpRecord>> {
        let t = self.tables.read().await;
        Ok(t.otps
            .iter()
            .rev()
            .find(|o| o.verification_id == verification_id && !o.is_used)
            .cloned())
    }

    async fn record_failed_attempt(&self, otp_id: Uuid) -> AppResult<()> {
        let mut t = self.tables.write().await;
        if let Some(otp) = t.otps.iter_mut().find(|o| o.id == otp_id) {
            otp.attempts += 1;
        }
        Ok(())
    }

    async fn complete_registration(&self, otp_id: Uuid, phone: &str) -> AppResult<Option<User>> {
        let mut t = self.tables.write().await;
        let Some(pending) = t.pending.get(phone).cloned() else {
            return Ok(None);
        };

        let user = t.insert_unique_user(pending.into_verified_user())?;
        t.pending.remove(phone);
        if let Some(otp) = t.otps.iter_mut().find(|o| o.id == otp_id) {
            otp.is_used = true;
        }
        Ok(Some(user))
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn insert_cycle(&self, cycle: Cycle) -> AppResult<Cycle> {
        self.tables.write().await.cycles.push(cycle.clone());
        Ok(cycle)
    }

    async fn list_cycles(&self, user_id: Uuid) -> AppResult<Vec<Cycle>> {
        let t = self.tables.read().await;
        let mut cycles: Vec<Cycle> = t.cycles.iter().filter(|c| c.user_id == user_id).cloned().collect();
        cycles.sort_by_key(|c| (c.start_date, c.created_at));
        Ok(cycles)
    }

    async fn latest_cycle(&self, user_id: Uuid) -> AppResult<Option<Cycle>> {
        Ok(self.list_cycles(user_id).await?.pop())
    }

    async fn upsert_insight(&self, insight: StoredInsight) -> AppResult<()> {
        self.tables.write().await.insights.insert(insight.user_id, insight);
        Ok(())
    }

    async fn get_insight(&self, user_id: Uuid) -> AppResult<Option<StoredInsight>> {
        Ok(self.tables.read().await.insights.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::InsightKey;
    use crate::models::{CycleInput, Language};
    use crate::prediction::predict;
    use chrono::{Duration, NaiveDate, Utc};

    fn pending(phone: &str, username: &str) -> PendingUser {
        PendingUser {
            phone_number: phone.into(),
            email: format!("{username}@example.com"),
            username: username.into(),
            first_name: "A".into(),
            last_name: "B".into(),
            hashed_password: "x".into(),
            role: "user".into(),
            language_preference: Language::En,
            expires_at: Utc::now() + Duration::minutes(5),
        }
    }

    fn otp(phone: &str) -> OtpRecord {
        OtpRecord {
            id: Uuid::new_v4(),
            verification_id: Uuid::new_v4(),
            phone: phone.into(),
            otp_hashed: "h".into(),
            attempts: 0,
            is_used: false,
            expires_at: Utc::now() + Duration::minutes(5),
        }
    }

    fn insight(user_id: Uuid, key: InsightKey) -> StoredInsight {
        StoredInsight {
            user_id,
            prediction: predict(&CycleInput {
                last_period_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                cycle_length: None,
                period_length: None,
                symptoms: vec![],
            }),
            symptoms: vec![],
            insight_key: key,
            insight_text: key.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn new_registration_replaces_previous_code() {
        let store = MemoryStore::new();
        let first = otp("+234");
        let second = otp("+234");
        store.start_registration(pending("+234", "ada"), first.clone()).await.unwrap();
        store.start_registration(pending("+234", "ada2"), second.clone()).await.unwrap();

        assert!(store.find_active_otp(first.verification_id).await.unwrap().is_none());
        assert!(store.find_active_otp(second.verification_id).await.unwrap().is_some());

        let user = store.complete_registration(second.id, "+234").await.unwrap().unwrap();
        assert_eq!(user.username, "ada2");
        assert!(user.is_verified);
        assert!(store.find_active_otp(second.verification_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn completing_a_claimed_email_changes_nothing() {
        let store = MemoryStore::new();
        let first = otp("+1");
        let second = otp("+2");
        store.start_registration(pending("+1", "dup"), first.clone()).await.unwrap();
        store.start_registration(pending("+2", "dup"), second.clone()).await.unwrap();

        assert!(store.complete_registration(first.id, "+1").await.unwrap().is_some());
        let err = store.complete_registration(second.id, "+2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // the losing code is still active and its registration data kept
        assert!(store.find_active_otp(second.verification_id).await.unwrap().is_some());
        assert!(store.tables.read().await.pending.contains_key("+2"));
        assert!(store.find_user_by_email("dup@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn users_table_rejects_taken_username() {
        let store = MemoryStore::new();
        let mut t = store.tables.write().await;
        t.insert_unique_user(pending("+1", "sade").into_verified_user()).unwrap();

        let mut other = pending("+2", "sade").into_verified_user();
        other.email = "other@example.com".into();
        let err = t.insert_unique_user(other).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn insight_is_overwritten_not_appended() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.upsert_insight(insight(user, InsightKey::Default)).await.unwrap();
        store.upsert_insight(insight(user, InsightKey::HighFertility)).await.unwrap();

        let stored = store.get_insight(user).await.unwrap().unwrap();
        assert_eq!(stored.insight_key, InsightKey::HighFertility);
    }
}
