use crate::streaks::tracker::StreakTracker;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Handlers never touch the database or cache directly; all streak reads and
/// writes go through the tracker, which owns its collaborators as `Arc<dyn …>`.
#[derive(Clone)]
pub struct AppState {
    pub tracker: StreakTracker,
}
