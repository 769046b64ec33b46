pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::streaks::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Streak API
        .route("/api/v1/streaks/:user_id", get(handlers::handle_get_stats))
        .route(
            "/api/v1/streaks/:user_id/activity",
            post(handlers::handle_record_activity),
        )
        // Cron-invoked sweeps (not exposed through the public gateway)
        .route(
            "/internal/streaks/:user_id/check",
            post(handlers::handle_check_streak),
        )
        .route(
            "/internal/streaks/:user_id/critical",
            post(handlers::handle_critical_notification),
        )
        .route("/internal/streaks/check", post(handlers::handle_reset_sweep))
        .route(
            "/internal/streaks/critical",
            post(handlers::handle_critical_sweep),
        )
        .with_state(state)
}
