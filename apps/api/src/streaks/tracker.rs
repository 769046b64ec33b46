//! StreakTracker — the only writer of streak records.
//!
//! Orchestrates the pure policy over the store, the notification sink, and
//! the cache layer. `now` is always an explicit argument so scheduled sweeps
//! and tests drive the clock; handlers pass `Utc::now()`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::models::{CriticalSweepSummary, StreakRow, StreakStats, StreakUpdate, SweepResult, SweepSummary};
use super::notify::{NewNotification, NotificationKind, NotificationSink};
use super::policy;
use super::store::StreakStore;
use crate::cache::{keys, CacheLayer};
use crate::errors::AppError;

/// TTL for the cached stats read path. Short enough that a lost
/// invalidation self-heals within minutes.
const STATS_TTL_SECONDS: u64 = 300;

#[derive(Clone)]
pub struct StreakTracker {
    store: Arc<dyn StreakStore>,
    notifier: Arc<dyn NotificationSink>,
    cache: CacheLayer,
    /// Rest-day allowance stamped onto lazily created records.
    rest_days_allowed: i32,
}

impl StreakTracker {
    pub fn new(
        store: Arc<dyn StreakStore>,
        notifier: Arc<dyn NotificationSink>,
        cache: CacheLayer,
        rest_days_allowed: i32,
    ) -> Self {
        Self {
            store,
            notifier,
            cache,
            rest_days_allowed,
        }
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.store.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User {user_id} not found")))
        }
    }

    /// Records a workout completion or an explicit rest-day declaration.
    /// Creates the streak record on first activity. Same-day repeats are
    /// idempotent on all counters.
    pub async fn update_streak(
        &self,
        user_id: Uuid,
        is_workout: bool,
        now: DateTime<Utc>,
    ) -> Result<StreakUpdate, AppError> {
        self.ensure_user(user_id).await?;

        let mut record = match self.store.find(user_id).await? {
            Some(record) => record,
            None => StreakRow::new(user_id, self.rest_days_allowed, now),
        };

        let outcome = policy::apply_activity(&mut record, now, is_workout);
        if outcome.changed {
            self.store.upsert(&record).await?;
            self.cache
                .invalidate_pattern(&keys::user_streaks_pattern(user_id))
                .await;
            info!(
                "Recorded {} for user {user_id}: streak {}, rest days {}/{}",
                if is_workout { "workout" } else { "rest day" },
                record.current_streak,
                record.rest_days_used,
                record.rest_days_allowed,
            );
        }

        Ok(StreakUpdate {
            record,
            broke_streak: outcome.broke_streak,
        })
    }

    /// Periodic check for a streak the user has silently abandoned. A user
    /// who stops training never calls `update_streak` again, so this sweep
    /// is what transitions their displayed streak to zero.
    pub async fn check_and_reset(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SweepResult, AppError> {
        self.ensure_user(user_id).await?;

        let Some(mut record) = self.store.find(user_id).await? else {
            return Ok(SweepResult {
                was_reset: false,
                record: StreakRow::new(user_id, self.rest_days_allowed, now),
            });
        };

        if !policy::streak_expired(&record, now) {
            return Ok(SweepResult {
                was_reset: false,
                record,
            });
        }

        record.current_streak = 0;
        record.rest_days_used = 0;
        record.updated_at = now;
        self.store.upsert(&record).await?;
        self.cache.invalidate_key(&keys::streak_stats(user_id)).await;
        info!("Reset abandoned streak for user {user_id}");

        Ok(SweepResult {
            was_reset: true,
            record,
        })
    }

    /// Sends the "streak at risk" reminder when the user is on their final
    /// rest day. The `risk_notified_at` marker persisted with the record
    /// keeps repeated invocations within one window to a single notification.
    pub async fn send_critical_day_notification(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.ensure_user(user_id).await?;

        let Some(mut record) = self.store.find(user_id).await? else {
            return Ok(false);
        };
        if !policy::should_notify_critical(&record, now) {
            return Ok(false);
        }

        self.notifier
            .create_notification(NewNotification {
                user_id,
                title: "Your workout streak is at risk".to_string(),
                message: format!(
                    "Your {}-day streak ends today. Complete a workout to keep it going!",
                    record.current_streak
                ),
                kind: NotificationKind::Workout,
            })
            .await?;

        record.risk_notified_at = Some(now);
        record.updated_at = now;
        self.store.upsert(&record).await?;
        info!("Sent critical-day notification to user {user_id}");

        Ok(true)
    }

    /// Read-only stats, served through the cache. A missing record is a
    /// valid zeroed state for any existing user.
    pub async fn get_streak_stats(&self, user_id: Uuid) -> Result<StreakStats, AppError> {
        self.ensure_user(user_id).await?;

        let key = keys::streak_stats(user_id);
        let store = Arc::clone(&self.store);
        let rest_days_allowed = self.rest_days_allowed;
        self.cache
            .get_cached(&key, STATS_TTL_SECONDS, move || async move {
                Ok(match store.find(user_id).await? {
                    Some(record) => StreakStats::from(&record),
                    None => StreakStats::empty(rest_days_allowed),
                })
            })
            .await
    }

    /// Hourly cron target: applies `check_and_reset` to every active streak.
    pub async fn run_reset_sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, AppError> {
        let ids = self.store.active_streak_user_ids().await?;
        let checked = ids.len();
        let mut reset = 0;
        for user_id in ids {
            match self.check_and_reset(user_id, now).await {
                Ok(result) if result.was_reset => reset += 1,
                Ok(_) => {}
                // User deleted between listing and checking; skip.
                Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        info!("Streak reset sweep: {checked} checked, {reset} reset");
        Ok(SweepSummary { checked, reset })
    }

    /// Two-hourly cron target: critical-day reminders for active streaks.
    pub async fn run_critical_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<CriticalSweepSummary, AppError> {
        let ids = self.store.active_streak_user_ids().await?;
        let checked = ids.len();
        let mut notified = 0;
        for user_id in ids {
            match self.send_critical_day_notification(user_id, now).await {
                Ok(true) => notified += 1,
                Ok(false) => {}
                Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        info!("Critical-day sweep: {checked} checked, {notified} notified");
        Ok(CriticalSweepSummary { checked, notified })
    }
}
