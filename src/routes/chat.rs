use axum::{extract::State, routing::post, Json, Router};

use crate::error::{AppError, AppResult};
use crate::models::{MessageRequest, MessageResponse};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat_with_ai))
}

async fn chat_with_ai(
    State(state): State<AppState>,
    Json(body): Json<MessageRequest>,
) -> AppResult<Json<MessageResponse>> {
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("AI chat is not configured".into()))?;

    let reply = generator.generate(&body.message).await.map_err(|e| {
        tracing::error!("❌ AI request failed: {:?}", e);
        AppError::ExternalService("AI service is unavailable. Please try again later.".into())
    })?;

    Ok(Json(MessageResponse { reply }))
}
