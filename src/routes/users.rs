use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{UpdateUserProfileRequest, UserProfile};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/get_user", get(get_user))
        .route("/user/delete_user", delete(delete_user))
        .route("/user/profile", get(get_profile).put(update_profile))
}

async fn get_user(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let user = state
        .store
        .get_user(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User Not Found!".into()))?;

    Ok(Json(json!({
        "username": user.username,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "role": user.role,
        "phone_number": user.phone_number,
        "language_preference": user.language_preference,
    })))
}

async fn delete_user(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    if !state.store.delete_user(current.id).await? {
        return Err(AppError::Unauthorized("User Not Found!".into()));
    }

    tracing::info!("🗑️ User {} deleted", current.id);
    Ok(Json(json!({ "message": "User deleted" })))
}

/// Creates an empty profile the first time it is read.
async fn get_profile(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<UserProfile>> {
    if let Some(profile) = state.store.get_profile(current.id).await? {
        return Ok(Json(profile));
    }

    if state.store.get_user(current.id).await?.is_none() {
        return Err(AppError::Unauthorized("User Not Found!".into()));
    }

    let profile = state
        .store
        .upsert_profile(UserProfile {
            user_id: current.id,
            ..UserProfile::default()
        })
        .await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<UpdateUserProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;

    let user = state
        .store
        .get_user(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User Not Found!".into()))?;

    let profile = state
        .store
        .upsert_profile(UserProfile {
            user_id: user.id,
            age: Some(body.age),
            cycle_length: Some(body.cycle_length),
            last_period_date: Some(body.last_period_date),
            ttc_history: body.ttc_history,
            faith_preference: Some(body.faith_preference),
            audio_preference: Some(body.audio_preference),
        })
        .await?;
    Ok(Json(profile))
}
