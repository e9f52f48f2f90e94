use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{create_access_token, generate_otp, hash_secret, verify_secret};
use crate::error::{AppError, AppResult};
use crate::models::{CreateUserRequest, LoginForm, OtpRecord, PendingUser, Token, VerifyOtpRequest};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/send-otp", post(send_otp))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/token", post(login))
        .route("/auth/logout", post(logout))
}

/// Step 1 of registration: park the details and text a code to the phone.
async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;

    if state.store.email_or_username_taken(&body.email, &body.username).await? {
        return Err(AppError::Conflict("Email or username already exists".into()));
    }

    let otp_config = &state.config.otp;
    let cost = state.config.auth.bcrypt_cost;
    let otp_code = generate_otp(otp_config.length);
    let expires_at = Utc::now() + Duration::minutes(otp_config.expire_minutes);
    let verification_id = Uuid::new_v4();

    let otp = OtpRecord {
        id: Uuid::new_v4(),
        verification_id,
        phone: body.phone_number.clone(),
        otp_hashed: hash_secret(&otp_code, cost)?,
        attempts: 0,
        is_used: false,
        expires_at,
    };

    let pending = PendingUser {
        phone_number: body.phone_number.clone(),
        email: body.email,
        username: body.username,
        first_name: body.first_name,
        last_name: body.last_name,
        hashed_password: hash_secret(&body.password, cost)?,
        role: body.role,
        language_preference: body.language_preference.unwrap_or_default(),
        expires_at,
    };

    state.store.start_registration(pending, otp).await?;

    state
        .otp_sender
        .send_sms(&body.phone_number, &format!("Your verification code is {}", otp_code))
        .await
        .map_err(|e| {
            tracing::error!("❌ OTP delivery failed: {:?}", e);
            AppError::ExternalService("Failed to send OTP. Please try again.".into())
        })?;

    Ok(Json(json!({
        "message": "OTP sent successfully",
        "verification_id": verification_id,
    })))
}

/// Step 2 of registration: check the code and create the verified user.
async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let otp = state
        .store
        .find_active_otp(body.verification_id)
        .await?
        .ok_or(AppError::OtpNotFound)?;

    if otp.expires_at < Utc::now() {
        return Err(AppError::OtpExpired);
    }

    if otp.attempts >= state.config.otp.max_attempts {
        return Err(AppError::TooManyAttempts);
    }

    if !verify_secret(&body.otp_code, &otp.otp_hashed) {
        state.store.record_failed_attempt(otp.id).await?;
        return Err(AppError::InvalidOtp);
    }

    let user = state
        .store
        .complete_registration(otp.id, &otp.phone)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration data".into()))?;

    tracing::info!("👤 User {} verified", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user_id": user.id })),
    ))
}

/// Password grant. `username` carries the email address.
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> AppResult<Json<Token>> {
    let user = state
        .store
        .find_user_by_email(&form.username)
        .await?
        .filter(|u| verify_secret(&form.password, &u.hashed_password))
        .ok_or(AppError::InvalidCredentials)?;

    let access_token = create_access_token(&user, &state.config.auth)?;

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logout successful" }))
}
