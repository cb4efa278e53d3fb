//! Trial period policy.

use chrono::Duration;

use crate::types::Timestamp;

/// Length of the free trial granted to a new organization.
pub const TRIAL_LENGTH_DAYS: i64 = 14;

/// Trials ending within this many days receive a reminder email.
pub const REMINDER_WINDOW_DAYS: i64 = 3;

pub const SUBSCRIPTION_TRIALING: &str = "trialing";
pub const SUBSCRIPTION_ACTIVE: &str = "active";
pub const SUBSCRIPTION_CANCELED: &str = "canceled";
pub const SUBSCRIPTION_EXPIRED: &str = "expired";

/// Trial end for an organization created at `now`.
pub fn trial_end_from(now: Timestamp) -> Timestamp {
    now + Duration::days(TRIAL_LENGTH_DAYS)
}

/// Whole days left in a trial, never negative.
pub fn days_remaining(trial_ends_at: Timestamp, now: Timestamp) -> i64 {
    (trial_ends_at - now).num_days().max(0)
}
