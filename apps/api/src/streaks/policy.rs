//! The streak state machine, kept pure so it can be tested without a store
//! or a real clock. All decisions are a function of (record, now, event).
//!
//! Day arithmetic is calendar-based: two activities on the same calendar day
//! are a gap of 0 regardless of the hours between them.

use chrono::{DateTime, Utc};

use super::models::StreakRow;

/// Hours of inactivity before the final rest day counts as the critical
/// window for a reminder. Most of a day has passed, but there is still time
/// to save the streak.
pub const CRITICAL_WINDOW_HOURS: i64 = 20;

/// Outcome of applying one activity event to a streak record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityOutcome {
    /// False only for a same-day no-op (repeat rest declaration); the caller
    /// can skip persistence entirely.
    pub changed: bool,
    pub broke_streak: bool,
}

/// Calendar-day gap between the last recorded activity and `now`.
/// `None` means no activity has ever been recorded. Clock skew that puts
/// `now` before the last activity is clamped to a same-day gap.
pub fn days_since_activity(record: &StreakRow, now: DateTime<Utc>) -> Option<i64> {
    record
        .last_activity_at
        .map(|last| (now.date_naive() - last.date_naive()).num_days().max(0))
}

/// Applies a workout completion (`is_workout`) or an explicit rest-day
/// declaration (`!is_workout`) to the record.
///
/// Policy: a gap of 0 never touches counters (same-day idempotence); a gap
/// of 1 extends on workout or consumes one rest credit; any gap greater
/// than 1 breaks the streak outright — a credit covers exactly one declared
/// rest day, never an undeclared multi-day gap.
pub fn apply_activity(
    record: &mut StreakRow,
    now: DateTime<Utc>,
    is_workout: bool,
) -> ActivityOutcome {
    let outcome = match days_since_activity(record, now) {
        // First ever activity: a workout anchors a streak of 1, a bare rest
        // day has nothing to preserve.
        None => {
            record.current_streak = if is_workout { 1 } else { 0 };
            record.rest_days_used = 0;
            ActivityOutcome {
                changed: true,
                broke_streak: false,
            }
        }
        Some(0) => {
            if !is_workout {
                // Repeat same-day rest declaration: nothing to record.
                return ActivityOutcome {
                    changed: false,
                    broke_streak: false,
                };
            }
            // Repeat same-day workout: counters untouched, timestamps refresh.
            ActivityOutcome {
                changed: true,
                broke_streak: false,
            }
        }
        Some(1) => {
            if is_workout {
                record.current_streak += 1;
                // A workout clears accumulated rest credits for the new day.
                record.rest_days_used = 0;
                ActivityOutcome {
                    changed: true,
                    broke_streak: false,
                }
            } else if record.rest_days_used < record.rest_days_allowed {
                record.rest_days_used += 1;
                ActivityOutcome {
                    changed: true,
                    broke_streak: false,
                }
            } else {
                // Allowance exhausted: this rest day breaks the streak.
                record.current_streak = 0;
                record.rest_days_used = 0;
                ActivityOutcome {
                    changed: true,
                    broke_streak: true,
                }
            }
        }
        Some(_) => {
            let had_streak = record.current_streak > 0;
            record.current_streak = if is_workout { 1 } else { 0 };
            record.rest_days_used = 0;
            ActivityOutcome {
                changed: true,
                broke_streak: had_streak,
            }
        }
    };

    if is_workout {
        record.last_workout_at = Some(now);
    }
    record.last_activity_at = Some(now);
    record.longest_streak = record.longest_streak.max(record.current_streak);
    record.updated_at = now;
    outcome
}

/// Whether an active streak has been abandoned: the gap exceeds the best
/// case in which the user had declared every remaining rest credit in time,
/// plus the one day they could still act on.
pub fn streak_expired(record: &StreakRow, now: DateTime<Utc>) -> bool {
    if record.current_streak == 0 {
        return false;
    }
    let Some(gap) = days_since_activity(record, now) else {
        return false;
    };
    let remaining = i64::from((record.rest_days_allowed - record.rest_days_used).max(0));
    gap > remaining + 1
}

/// Whether the user is in the critical window for a "streak at risk"
/// reminder and has not been notified for this window yet.
///
/// Critical: an active streak sitting on its final rest credit, with at
/// least [`CRITICAL_WINDOW_HOURS`] of inactivity. The window is
/// already-notified once `risk_notified_at` is newer than the activity
/// that opened it.
pub fn should_notify_critical(record: &StreakRow, now: DateTime<Utc>) -> bool {
    if record.current_streak == 0 {
        return false;
    }
    if record.rest_days_used != record.rest_days_allowed - 1 {
        return false;
    }
    let Some(last_activity) = record.last_activity_at else {
        return false;
    };
    if now.signed_duration_since(last_activity).num_hours() < CRITICAL_WINDOW_HOURS {
        return false;
    }
    match record.risk_notified_at {
        Some(notified) => notified <= last_activity,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    fn fresh_record(rest_days_allowed: i32) -> StreakRow {
        StreakRow::new(Uuid::new_v4(), rest_days_allowed, day(0))
    }

    #[test]
    fn first_workout_starts_streak() {
        let mut rec = fresh_record(2);
        let outcome = apply_activity(&mut rec, day(0), true);

        assert!(outcome.changed);
        assert!(!outcome.broke_streak);
        assert_eq!(rec.current_streak, 1);
        assert_eq!(rec.longest_streak, 1);
        assert_eq!(rec.last_workout_at, Some(day(0)));
        assert_eq!(rec.last_activity_at, Some(day(0)));
    }

    #[test]
    fn rest_day_without_prior_activity_has_nothing_to_preserve() {
        let mut rec = fresh_record(2);
        let outcome = apply_activity(&mut rec, day(0), false);

        assert!(outcome.changed);
        assert_eq!(rec.current_streak, 0);
        assert_eq!(rec.rest_days_used, 0);
        assert!(rec.last_workout_at.is_none());
        assert_eq!(rec.last_activity_at, Some(day(0)));
    }

    #[test]
    fn same_day_workout_is_idempotent_on_counters() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        let later_same_day = day(0) + Duration::hours(6);
        let outcome = apply_activity(&mut rec, later_same_day, true);

        assert!(outcome.changed); // timestamps refresh
        assert_eq!(rec.current_streak, 1);
        assert_eq!(rec.rest_days_used, 0);
        assert_eq!(rec.last_workout_at, Some(later_same_day));
    }

    #[test]
    fn same_day_rest_declaration_is_a_noop() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        let outcome = apply_activity(&mut rec, day(0) + Duration::hours(2), false);

        assert!(!outcome.changed);
        assert_eq!(rec.last_activity_at, Some(day(0)));
    }

    #[test]
    fn next_day_workout_extends_and_clears_credits() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        apply_activity(&mut rec, day(1), false); // uses one credit
        assert_eq!(rec.rest_days_used, 1);

        apply_activity(&mut rec, day(2), true);
        assert_eq!(rec.current_streak, 2);
        assert_eq!(rec.rest_days_used, 0);
    }

    #[test]
    fn rest_day_preserves_streak_without_incrementing() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        let outcome = apply_activity(&mut rec, day(1), false);

        assert!(!outcome.broke_streak);
        assert_eq!(rec.current_streak, 1);
        assert_eq!(rec.rest_days_used, 1);
        assert_eq!(rec.last_workout_at, Some(day(0))); // only workouts move it
        assert_eq!(rec.last_activity_at, Some(day(1)));
    }

    #[test]
    fn exhausted_allowance_breaks_and_recovers_to_zero() {
        // workout d0, rest d1, rest d2, rest d3 with allowance 2: the third
        // rest day has no credit left and breaks the streak.
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        apply_activity(&mut rec, day(1), false);
        apply_activity(&mut rec, day(2), false);
        assert_eq!(rec.rest_days_used, 2);

        let outcome = apply_activity(&mut rec, day(3), false);
        assert!(outcome.broke_streak);
        assert_eq!(rec.current_streak, 0);
        assert_eq!(rec.rest_days_used, 0);
    }

    #[test]
    fn rest_days_used_never_exceeds_allowance() {
        let mut rec = fresh_record(3);
        apply_activity(&mut rec, day(0), true);
        for n in 1..=6 {
            apply_activity(&mut rec, day(n), false);
            assert!(rec.rest_days_used <= rec.rest_days_allowed);
        }
    }

    #[test]
    fn multi_day_gap_resets_workout_to_one() {
        let mut rec = fresh_record(2);
        for n in 0..5 {
            apply_activity(&mut rec, day(n), true);
        }
        assert_eq!(rec.current_streak, 5);

        let outcome = apply_activity(&mut rec, day(10), true);
        assert!(outcome.broke_streak);
        assert_eq!(rec.current_streak, 1);
        assert_eq!(rec.longest_streak, 5);
    }

    #[test]
    fn multi_day_gap_rest_declaration_resets_to_zero() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        let outcome = apply_activity(&mut rec, day(4), false);

        assert!(outcome.broke_streak);
        assert_eq!(rec.current_streak, 0);
        assert_eq!(rec.rest_days_used, 0);
    }

    #[test]
    fn longest_streak_never_decreases() {
        let mut rec = fresh_record(1);
        let mut max_seen = 0;
        let events = [
            (0, true),
            (1, true),
            (2, false),
            (3, false), // break
            (4, true),
            (5, true),
            (9, true), // gap break
        ];
        for (n, is_workout) in events {
            apply_activity(&mut rec, day(n), is_workout);
            assert!(rec.longest_streak >= max_seen);
            assert!(rec.longest_streak >= rec.current_streak);
            max_seen = rec.longest_streak;
        }
        assert_eq!(rec.longest_streak, 2);
    }

    #[test]
    fn expiry_respects_remaining_credit_window() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);

        // Allowance 2, none used: survives up to a 3-day gap.
        assert!(!streak_expired(&rec, day(3)));
        assert!(streak_expired(&rec, day(4)));

        // One credit consumed: the window shrinks by a day.
        apply_activity(&mut rec, day(1), false);
        assert!(!streak_expired(&rec, day(3)));
        assert!(streak_expired(&rec, day(4)));
    }

    #[test]
    fn zero_streak_never_expires() {
        let rec = fresh_record(2);
        assert!(!streak_expired(&rec, day(30)));
    }

    #[test]
    fn critical_window_requires_final_credit_and_elapsed_hours() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        apply_activity(&mut rec, day(1), false); // rest_days_used == allowed - 1

        let too_soon = day(1) + Duration::hours(CRITICAL_WINDOW_HOURS - 1);
        assert!(!should_notify_critical(&rec, too_soon));

        let in_window = day(1) + Duration::hours(CRITICAL_WINDOW_HOURS + 1);
        assert!(should_notify_critical(&rec, in_window));
    }

    #[test]
    fn critical_window_is_quiet_with_credits_remaining() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        assert!(!should_notify_critical(&rec, day(1)));
    }

    #[test]
    fn critical_notification_marker_silences_the_window() {
        let mut rec = fresh_record(2);
        apply_activity(&mut rec, day(0), true);
        apply_activity(&mut rec, day(1), false);

        let now = day(2) + Duration::hours(2);
        assert!(should_notify_critical(&rec, now));

        rec.risk_notified_at = Some(now);
        assert!(!should_notify_critical(&rec, now + Duration::hours(1)));

        // New activity reopens eligibility for a future window.
        apply_activity(&mut rec, day(2) + Duration::hours(3), true);
        apply_activity(&mut rec, day(3), false);
        assert!(should_notify_critical(
            &rec,
            day(3) + Duration::hours(CRITICAL_WINDOW_HOURS)
        ));
    }
}
