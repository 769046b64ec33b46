use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{CriticalSweepSummary, StreakStats, StreakUpdate, SweepResult, SweepSummary};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ActivityRequest {
    /// True for a completed workout, false for an explicit rest-day
    /// declaration.
    pub is_workout: bool,
}

#[derive(Serialize)]
pub struct CriticalResult {
    pub notified: bool,
}

/// GET /api/v1/streaks/:user_id
pub async fn handle_get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StreakStats>, AppError> {
    let stats = state.tracker.get_streak_stats(user_id).await?;
    Ok(Json(stats))
}

/// POST /api/v1/streaks/:user_id/activity
pub async fn handle_record_activity(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ActivityRequest>,
) -> Result<Json<StreakUpdate>, AppError> {
    let update = state
        .tracker
        .update_streak(user_id, req.is_workout, Utc::now())
        .await?;
    Ok(Json(update))
}

/// POST /internal/streaks/:user_id/check
pub async fn handle_check_streak(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SweepResult>, AppError> {
    let result = state.tracker.check_and_reset(user_id, Utc::now()).await?;
    Ok(Json(result))
}

/// POST /internal/streaks/:user_id/critical
pub async fn handle_critical_notification(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CriticalResult>, AppError> {
    let notified = state
        .tracker
        .send_critical_day_notification(user_id, Utc::now())
        .await?;
    Ok(Json(CriticalResult { notified }))
}

/// POST /internal/streaks/check — hourly cron target.
pub async fn handle_reset_sweep(
    State(state): State<AppState>,
) -> Result<Json<SweepSummary>, AppError> {
    let summary = state.tracker.run_reset_sweep(Utc::now()).await?;
    Ok(Json(summary))
}

/// POST /internal/streaks/critical — two-hourly cron target.
pub async fn handle_critical_sweep(
    State(state): State<AppState>,
) -> Result<Json<CriticalSweepSummary>, AppError> {
    let summary = state.tracker.run_critical_sweep(Utc::now()).await?;
    Ok(Json(summary))
}
