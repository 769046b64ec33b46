//! Deterministic cache key builders.
//!
//! Keys are colon-delimited: `<domain>:<view>:<owner>`. Writers invalidate
//! with [`user_streaks_pattern`] so every cached view of a user's streak
//! disappears together.

use uuid::Uuid;

/// Cached streak stats for one user (the `getStreakStats` read path).
pub fn streak_stats(user_id: Uuid) -> String {
    format!("streaks:stats:{user_id}")
}

/// Glob matching every streak-derived cache entry for one user.
pub fn user_streaks_pattern(user_id: Uuid) -> String {
    format!("streaks:*:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_key_is_stable_per_user() {
        let id = Uuid::nil();
        assert_eq!(
            streak_stats(id),
            "streaks:stats:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn pattern_covers_stats_key() {
        let id = Uuid::new_v4();
        let pattern = user_streaks_pattern(id);
        let (prefix, suffix) = pattern.split_once('*').unwrap();
        let key = streak_stats(id);
        assert!(key.starts_with(prefix) && key.ends_with(suffix));
    }
}
