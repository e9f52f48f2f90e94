//! Password and OTP hashing, JWT issuance, and the bearer-token extractor

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub id: Uuid,
    pub role: String,
    pub exp: i64,
}

pub fn hash_secret(plain: &str, cost: u32) -> AppResult<String> {
    bcrypt::hash(plain, cost).map_err(|e| AppError::Internal(e.into()))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_secret(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}

/// Numeric code with exactly `length` digits and no leading zero.
pub fn generate_otp(length: u32) -> String {
    let length = length.clamp(1, 9);
    let low = 10u32.pow(length - 1);
    let high = 10u32.pow(length) - 1;
    rand::thread_rng().gen_range(low..=high).to_string()
}

pub fn create_access_token(user: &User, config: &AuthConfig) -> AppResult<String> {
    let claims = Claims {
        sub: user.email.clone(),
        id: user.id,
        role: user.role.clone(),
        exp: (Utc::now() + Duration::minutes(config.token_expiry_minutes)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.into()))
}

pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Could not validate user!".into()))
}

/// Caller identity taken from a valid `Authorization: Bearer` token.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid Authorization header".into()))?;

        let claims = decode_access_token(token, &state.config.auth.jwt_secret)?;

        Ok(CurrentUser {
            id: claims.id,
            email: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            hashed_password: String::new(),
            role: "user".into(),
            phone_number: "+2348000000000".into(),
            is_verified: true,
            language_preference: Language::Ig,
            created_at: Utc::now(),
        }
    }

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_expiry_minutes: 20,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn otp_has_requested_digits() {
        for _ in 0..50 {
            let otp = generate_otp(4);
            assert_eq!(otp.len(), 4);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert!(!otp.starts_with('0'));
        }
    }

    #[test]
    fn hashed_secret_verifies() {
        let hash = hash_secret("1234", 4).unwrap();
        assert!(verify_secret("1234", &hash));
        assert!(!verify_secret("4321", &hash));
        assert!(!verify_secret("1234", "not-a-hash"));
    }

    #[test]
    fn token_round_trips_identity() {
        let user = user();
        let config = auth_config();
        let token = create_access_token(&user, &config).unwrap();
        let claims = decode_access_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.sub, user.email);
        assert!(decode_access_token(&token, "other-secret").is_err());
    }
}
