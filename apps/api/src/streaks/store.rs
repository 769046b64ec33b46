//! Persistence seam for streak records.
//!
//! The tracker depends on this trait, not on sqlx, so tests run against an
//! in-memory store and the Postgres implementation stays a thin query layer.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::StreakRow;
use crate::errors::AppError;

#[async_trait]
pub trait StreakStore: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, AppError>;

    /// The streak row, if one has been created for this user yet.
    async fn find(&self, user_id: Uuid) -> Result<Option<StreakRow>, AppError>;

    /// Inserts or fully replaces the user's streak row (lazy creation path).
    async fn upsert(&self, record: &StreakRow) -> Result<(), AppError>;

    /// Users with a non-zero current streak, for the periodic sweeps.
    async fn active_streak_user_ids(&self) -> Result<Vec<Uuid>, AppError>;
}

pub struct PgStreakStore {
    pool: PgPool,
}

impl PgStreakStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreakStore for PgStreakStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<StreakRow>, AppError> {
        Ok(
            sqlx::query_as::<_, StreakRow>("SELECT * FROM workout_streaks WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn upsert(&self, record: &StreakRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO workout_streaks
                (user_id, current_streak, longest_streak, last_workout_at,
                 last_activity_at, rest_days_used, rest_days_allowed,
                 risk_notified_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                current_streak = EXCLUDED.current_streak,
                longest_streak = EXCLUDED.longest_streak,
                last_workout_at = EXCLUDED.last_workout_at,
                last_activity_at = EXCLUDED.last_activity_at,
                rest_days_used = EXCLUDED.rest_days_used,
                rest_days_allowed = EXCLUDED.rest_days_allowed,
                risk_notified_at = EXCLUDED.risk_notified_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.user_id)
        .bind(record.current_streak)
        .bind(record.longest_streak)
        .bind(record.last_workout_at)
        .bind(record.last_activity_at)
        .bind(record.rest_days_used)
        .bind(record.rest_days_allowed)
        .bind(record.risk_notified_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn active_streak_user_ids(&self) -> Result<Vec<Uuid>, AppError> {
        Ok(
            sqlx::query_scalar("SELECT user_id FROM workout_streaks WHERE current_streak > 0")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
