//! Transactional email builders.

use serde::{Deserialize, Serialize};
use offboardpro_core::types::Timestamp;

/// A plain-text email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Invitation sent to a departing employee when their offboarding is finalized.
pub fn survey_invitation(
    to: &str,
    employee_name: &str,
    link: &str,
    expires_at: Timestamp,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "We'd value your feedback before you go".to_string(),
        body: format!(
            "Hi {employee_name},\n\n\
             Thank you for your time with us. We'd appreciate a few minutes of \
             honest feedback about your experience:\n\n{link}\n\n\
             The link can be used once and expires on {}.\n",
            expires_at.format("%Y-%m-%d")
        ),
    }
}

/// Alert sent to the actor who revoked connections.
pub fn security_alert(to: &str, revoked_count: usize, method: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Security alert: {revoked_count} app connection(s) revoked"),
        body: format!(
            "{revoked_count} OAuth app connection(s) were revoked ({method}) from your \
             OffboardPro account.\n\nThe full audit trail is available under Security > \
             Revocation logs.\n"
        ),
    }
}

/// Notice sent when a trial ends without a subscription.
pub fn trial_expired(to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Your OffboardPro trial has ended".to_string(),
        body: format!(
            "Hi {name},\n\nYour free trial has ended and your organization is now on the \
             Starter plan. Upgrade at any time to restore Professional features.\n"
        ),
    }
}

/// Reminder sent while a trial is about to end.
pub fn trial_reminder(to: &str, name: &str, days_left: i64) -> EmailMessage {
    let when = match days_left {
        d if d <= 0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        d => format!("in {d} days"),
    };
    EmailMessage {
        to: to.to_string(),
        subject: format!("Your OffboardPro trial ends {when}"),
        body: format!(
            "Hi {name},\n\nYour free trial ends {when}. Subscribe to keep AI insights, \
             security scans and higher limits.\n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn invitation_embeds_link_and_expiry() {
        let expires = Utc.with_ymd_and_hms(2026, 4, 30, 12, 0, 0).unwrap();
        let message = survey_invitation(
            "jamie@example.com",
            "Jamie",
            "https://app.example.com/exit-survey/abc",
            expires,
        );
        assert_eq!(message.to, "jamie@example.com");
        assert!(message.body.contains("https://app.example.com/exit-survey/abc"));
        assert!(message.body.contains("2026-04-30"));
    }

    #[test]
    fn reminder_wording_follows_days_left() {
        assert!(trial_reminder("a@b.co", "A", 0).subject.ends_with("today"));
        assert!(trial_reminder("a@b.co", "A", 1).subject.ends_with("in 1 day"));
        assert!(trial_reminder("a@b.co", "A", 3).subject.ends_with("in 3 days"));
    }

    #[test]
    fn alert_reports_count() {
        let message = security_alert("admin@acme.test", 4, "bulk");
        assert!(message.subject.contains('4'));
        assert!(message.body.contains("(bulk)"));
    }
}
