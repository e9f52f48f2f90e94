use axum::{extract::State, routing::get, Json, Router};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{Cycle, CycleInput, CyclePrediction, CycleRequest, CycleSummary};
use crate::prediction::{cycle_day, phase_guidance, predict};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cycle/cycles", get(list_cycles).post(create_cycle))
        .route("/cycle/summary", get(get_cycle_summary))
}

async fn create_cycle(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CycleRequest>,
) -> AppResult<Json<CyclePrediction>> {
    body.validate()?;

    let user = state
        .store
        .get_user(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User Not Found!".into()))?;

    let prediction = predict(&CycleInput {
        last_period_date: body.last_period_date,
        cycle_length: Some(body.cycle_length),
        period_length: Some(body.period_length),
        symptoms: body
            .symptoms
            .iter()
            .filter_map(|s| s.fertility_sign())
            .map(|sign| sign.tag().to_string())
            .collect(),
    });

    state
        .store
        .insert_cycle(Cycle {
            id: Uuid::new_v4(),
            user_id: user.id,
            start_date: body.last_period_date,
            cycle_length: body.cycle_length as i32,
            period_length: body.period_length as i32,
            symptoms: body.symptoms,
            created_at: Utc::now(),
        })
        .await?;

    Ok(Json(prediction))
}

async fn list_cycles(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<Cycle>>> {
    let cycles = state.store.list_cycles(current.id).await?;
    if cycles.is_empty() {
        return Err(AppError::NotFound("Cycles for this user".into()));
    }
    Ok(Json(cycles))
}

async fn get_cycle_summary(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<CycleSummary>> {
    let Some(cycle) = state.store.latest_cycle(current.id).await? else {
        return Err(AppError::NotFound("Cycle".into()));
    };

    let today = Utc::now().date_naive();
    let cycle_length = i64::from(cycle.cycle_length);
    let day = cycle_day(cycle.start_date, cycle_length, today);

    // Fertile window of the cycle containing today.
    let current_start = today - Duration::days(day - 1);
    let prediction = predict(&CycleInput {
        last_period_date: current_start,
        cycle_length: Some(cycle_length),
        period_length: Some(i64::from(cycle.period_length)),
        symptoms: vec![],
    });

    Ok(Json(CycleSummary {
        cycle_day: day,
        in_fertile_window: prediction.fertile_window.contains(today),
        period_expected_in_days: (prediction.next_period - today).num_days(),
        start_date: cycle.start_date,
        guidance: phase_guidance(day),
    }))
}
