//! Workout streak tracking: a per-user contiguous-activity counter with a
//! bounded rest-day allowance, swept periodically so abandoned streaks read
//! as broken without waiting for the user's next visit.

pub mod handlers;
pub mod models;
pub mod notify;
pub mod policy;
pub mod store;
pub mod tracker;
