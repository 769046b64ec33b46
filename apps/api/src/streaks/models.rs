use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One streak row per user, created lazily on first activity.
///
/// Invariants held by the policy layer after every update:
/// `current_streak >= 0`, `longest_streak >= current_streak`,
/// `rest_days_used <= rest_days_allowed`. Only the tracker mutates this row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StreakRow {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_workout_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub rest_days_used: i32,
    pub rest_days_allowed: i32,
    /// When the last "streak at risk" notification went out. The critical
    /// window is considered already-notified while this is newer than
    /// `last_activity_at`.
    pub risk_notified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl StreakRow {
    pub fn new(user_id: Uuid, rest_days_allowed: i32, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_workout_at: None,
            last_activity_at: None,
            rest_days_used: 0,
            rest_days_allowed,
            risk_notified_at: None,
            updated_at: now,
        }
    }
}

/// Read-only stats returned by the streak stats endpoint; this is the shape
/// stored in the cache, so it derives both serde directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub rest_days_used: i32,
    pub rest_days_allowed: i32,
}

impl StreakStats {
    /// Zeroed stats for a valid user with no streak row yet.
    pub fn empty(rest_days_allowed: i32) -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            rest_days_used: 0,
            rest_days_allowed,
        }
    }
}

impl From<&StreakRow> for StreakStats {
    fn from(row: &StreakRow) -> Self {
        Self {
            current_streak: row.current_streak,
            longest_streak: row.longest_streak,
            rest_days_used: row.rest_days_used,
            rest_days_allowed: row.rest_days_allowed,
        }
    }
}

/// Result of recording an activity.
#[derive(Debug, Clone, Serialize)]
pub struct StreakUpdate {
    pub record: StreakRow,
    pub broke_streak: bool,
}

/// Result of the periodic abandoned-streak check.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub was_reset: bool,
    pub record: StreakRow,
}

/// Summary of a sweep-all pass over every active streak.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub checked: usize,
    pub reset: usize,
}

/// Summary of a critical-notification pass.
#[derive(Debug, Clone, Serialize)]
pub struct CriticalSweepSummary {
    pub checked: usize,
    pub notified: usize,
}
