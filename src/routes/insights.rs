use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use validator::Validate;

use crate::ai::insight_prompt;
use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::insights::derive_key;
use crate::models::{CycleInput, InsightResponse, InsightsRequest, StoredInsight};
use crate::prediction::predict;
use crate::translations::localize;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/insights", get(get_insight).post(create_insight))
}

async fn create_insight(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<InsightsRequest>,
) -> AppResult<Json<InsightResponse>> {
    body.validate()?;

    let user = state
        .store
        .get_user(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User Not Found!".into()))?;

    let prediction = predict(&CycleInput {
        last_period_date: body.last_period_date,
        cycle_length: body.cycle_length,
        period_length: body.period_length,
        symptoms: body.symptoms.clone(),
    });

    let now = Utc::now();
    let key = derive_key(
        now.date_naive(),
        prediction.ovulation_day,
        prediction.fertile_window.start,
        prediction.fertile_window.end,
        prediction.fertility_score,
    );
    let insight_text = localize(key, user.language_preference.code());

    state
        .store
        .upsert_insight(StoredInsight {
            user_id: user.id,
            prediction: prediction.clone(),
            symptoms: body.symptoms,
            insight_key: key,
            insight_text: insight_text.clone(),
            updated_at: now,
        })
        .await?;

    let ai_insight = match &state.generator {
        Some(generator) => match generator.generate(&insight_prompt(&prediction)).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("AI insight failed: {:?}", e);
                None
            }
        },
        None => None,
    };

    Ok(Json(InsightResponse {
        prediction,
        insight_key: key,
        insight_text,
        ai_insight,
    }))
}

async fn get_insight(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<StoredInsight>> {
    state
        .store
        .get_insight(current.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Insight".into()))
}
