//! Offboarding and task lifecycle rules.
//!
//! An offboarding moves `in_progress -> completed` (explicit finalize or the
//! task cascade) or `in_progress -> cancelled`. Both end states are terminal.

use chrono::{Datelike, Duration, TimeZone, Utc};

use crate::types::{Date, Timestamp};

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

/// All valid offboarding status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_IN_PROGRESS, STATUS_COMPLETED, STATUS_CANCELLED];

pub const PRIORITY_HIGH: &str = "High";
pub const PRIORITY_MEDIUM: &str = "Medium";
pub const PRIORITY_LOW: &str = "Low";

/// All valid task priority values.
pub const VALID_PRIORITIES: &[&str] = &[PRIORITY_HIGH, PRIORITY_MEDIUM, PRIORITY_LOW];

/// Notification type written when a task is completed.
pub const NOTIFICATION_TASK_COMPLETED: &str = "task_completed";

/// Notification type written when the cascade completes an offboarding.
pub const NOTIFICATION_OFFBOARDING_COMPLETED: &str = "offboarding_completed";

/// Typed view of the offboarding `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffboardingStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl OffboardingStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_IN_PROGRESS => Some(Self::InProgress),
            STATUS_COMPLETED => Some(Self::Completed),
            STATUS_CANCELLED => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Completed => STATUS_COMPLETED,
            Self::Cancelled => STATUS_CANCELLED,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Whether `self -> next` is an allowed transition.
    pub fn can_transition_to(self, next: OffboardingStatus) -> bool {
        matches!(
            (self, next),
            (Self::InProgress, Self::Completed) | (Self::InProgress, Self::Cancelled)
        )
    }
}

/// Validate an offboarding status filter value.
pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

/// Validate a task priority value (case-sensitive, as stored).
pub fn validate_priority(priority: &str) -> Result<(), String> {
    if VALID_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(format!(
            "Invalid priority '{priority}'. Must be one of: {}",
            VALID_PRIORITIES.join(", ")
        ))
    }
}

/// Largest accepted template due offset, in days.
pub const MAX_DUE_OFFSET_DAYS: i32 = 3650;

/// Validate a template task's due offset.
pub fn validate_due_offset(due_offset_days: i32) -> Result<(), String> {
    if (0..=MAX_DUE_OFFSET_DAYS).contains(&due_offset_days) {
        Ok(())
    } else {
        Err(format!(
            "due_offset_days must be between 0 and {MAX_DUE_OFFSET_DAYS}"
        ))
    }
}

/// Due date of a materialized task: offboarding start plus the template offset.
pub fn task_due_date(start: Date, due_offset_days: i32) -> Result<Date, String> {
    start
        .checked_add_signed(Duration::days(i64::from(due_offset_days)))
        .ok_or_else(|| format!("Due offset of {due_offset_days} days is out of range"))
}

/// Start of the calendar month (UTC) containing `now`. Monthly offboarding
/// caps count records created since this instant.
pub fn month_start(now: Timestamp) -> Timestamp {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Whether completing a task should cascade the parent offboarding to
/// `completed`.
///
/// Only an `in_progress` offboarding with no incomplete tasks cascades; a
/// completed or cancelled parent never re-triggers.
pub fn should_cascade(status: OffboardingStatus, incomplete_tasks: i64) -> bool {
    status == OffboardingStatus::InProgress && incomplete_tasks == 0
}

/// Progress percentage for display, rounded down. Zero tasks is 0%.
pub fn progress_percent(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed.clamp(0, total) * 100) / total
}

/// Message for the notification sent to the offboarding creator.
pub fn task_completed_message(task_name: &str, employee_name: &str) -> String {
    format!("Task \"{task_name}\" was completed for {employee_name}'s offboarding")
}

/// Message for the notification sent when the cascade completes an offboarding.
pub fn offboarding_completed_message(task_name: &str, employee_name: &str) -> String {
    format!(
        "Task \"{task_name}\" was completed. All tasks are done and {employee_name}'s offboarding is now completed"
    )
}

/// Notification type and message for one task completion. A completion that
/// cascades the parent reports the offboarding instead of the task.
pub fn completion_notification(
    task_name: &str,
    employee_name: &str,
    cascaded: bool,
) -> (&'static str, String) {
    if cascaded {
        (
            NOTIFICATION_OFFBOARDING_COMPLETED,
            offboarding_completed_message(task_name, employee_name),
        )
    } else {
        (
            NOTIFICATION_TASK_COMPLETED,
            task_completed_message(task_name, employee_name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn status_round_trip() {
        for s in VALID_STATUSES {
            let parsed = OffboardingStatus::parse(s).expect("known status");
            assert_eq!(parsed.as_str(), *s);
        }
        assert!(OffboardingStatus::parse("done").is_none());
    }

    #[test]
    fn only_in_progress_transitions() {
        use OffboardingStatus::*;
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(InProgress));
    }

    #[test]
    fn cascade_requires_in_progress_and_no_open_tasks() {
        use OffboardingStatus::*;
        assert!(should_cascade(InProgress, 0));
        assert!(!should_cascade(InProgress, 1));
        assert!(!should_cascade(Completed, 0));
        assert!(!should_cascade(Cancelled, 0));
    }

    #[test]
    fn due_date_adds_offset() {
        assert_eq!(task_due_date(date(2026, 3, 30), 3), Ok(date(2026, 4, 2)));
        assert_eq!(task_due_date(date(2026, 3, 1), 0), Ok(date(2026, 3, 1)));
        assert_eq!(task_due_date(date(2026, 3, 1), -1), Ok(date(2026, 2, 28)));
    }

    #[test]
    fn due_date_overflow_is_an_error() {
        assert!(task_due_date(date(2026, 3, 1), i32::MAX).is_err());
        assert!(task_due_date(date(2026, 3, 1), i32::MIN).is_err());
    }

    #[test]
    fn due_offset_is_bounded() {
        assert!(validate_due_offset(0).is_ok());
        assert!(validate_due_offset(MAX_DUE_OFFSET_DAYS).is_ok());
        assert!(validate_due_offset(MAX_DUE_OFFSET_DAYS + 1).is_err());
        assert!(validate_due_offset(-1).is_err());
        assert!(validate_due_offset(i32::MAX).is_err());
    }

    #[test]
    fn priority_validation_is_case_sensitive() {
        assert!(validate_priority("High").is_ok());
        assert!(validate_priority("Low").is_ok());
        assert!(validate_priority("high").is_err());
        assert!(validate_priority("Urgent")
            .unwrap_err()
            .contains("Must be one of"));
    }

    #[test]
    fn progress_handles_edges() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(5, 3), 100);
    }

    #[test]
    fn cascading_completion_reports_the_offboarding() {
        let (kind, message) = completion_notification("Return laptop", "Ana", false);
        assert_eq!(kind, NOTIFICATION_TASK_COMPLETED);
        assert!(message.contains("Return laptop"));

        let (kind, message) = completion_notification("Return laptop", "Ana", true);
        assert_eq!(kind, NOTIFICATION_OFFBOARDING_COMPLETED);
        assert!(message.contains("Return laptop"));
        assert!(message.contains("Ana's offboarding is now completed"));
    }

    #[test]
    fn month_start_truncates_to_first_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 15, 42, 9).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn status_filter_validation() {
        assert!(validate_status("completed").is_ok());
        assert!(validate_status("archived").is_err());
    }
}
