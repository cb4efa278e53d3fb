//! Exit-survey token rules and survey statistics.
//!
//! A survey token is an opaque random string that lets an unauthenticated
//! former employee submit exactly one survey. State is `pending` until the
//! submission consumes it (`completed`). Expiry is never written; it is
//! checked against `expires_at` on every read.

use std::collections::BTreeMap;

use chrono::Duration;
use rand::Rng;
use serde::Serialize;

use crate::types::Timestamp;

pub const TOKEN_STATUS_PENDING: &str = "pending";
pub const TOKEN_STATUS_COMPLETED: &str = "completed";

/// Length of generated survey tokens (alphanumeric characters).
pub const TOKEN_LENGTH: usize = 40;

/// Default token lifetime when `SURVEY_TOKEN_TTL_DAYS` is not set.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Longest accepted token lifetime.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Inclusive bounds of the "how likely are you to recommend us" score.
pub const MIN_RECOMMEND_SCORE: i32 = 0;
pub const MAX_RECOMMEND_SCORE: i32 = 10;

pub const REASON_UNKNOWN: &str = "Invalid survey link";
pub const REASON_EXPIRED: &str = "This survey link has expired";
pub const REASON_COMPLETED: &str = "This survey has already been completed";

/// Generate a new opaque survey token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Validate a configured token lifetime.
pub fn validate_ttl_days(ttl_days: i64) -> Result<(), String> {
    if (1..=MAX_TOKEN_TTL_DAYS).contains(&ttl_days) {
        Ok(())
    } else {
        Err(format!(
            "survey token TTL must be between 1 and {MAX_TOKEN_TTL_DAYS} days, got {ttl_days}"
        ))
    }
}

/// Expiry instant for a token issued at `now`.
pub fn expiry_from(now: Timestamp, ttl_days: i64) -> Timestamp {
    now + Duration::days(ttl_days)
}

/// Outcome of checking a stored token against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Usable,
    Expired,
    Completed,
}

impl TokenState {
    /// Rejection reason shown to the survey taker, `None` when usable.
    pub fn rejection_reason(self) -> Option<&'static str> {
        match self {
            TokenState::Usable => None,
            TokenState::Expired => Some(REASON_EXPIRED),
            TokenState::Completed => Some(REASON_COMPLETED),
        }
    }
}

/// Classify a token row. A completed token reports `Completed` even after
/// its expiry so the taker learns the survey was already submitted.
pub fn classify(status: &str, expires_at: Timestamp, now: Timestamp) -> TokenState {
    if status == TOKEN_STATUS_COMPLETED {
        TokenState::Completed
    } else if expires_at < now {
        TokenState::Expired
    } else {
        TokenState::Usable
    }
}

/// Whether an existing token may be returned from the issuance fast path.
pub fn is_reusable(status: &str, expires_at: Timestamp, now: Timestamp) -> bool {
    classify(status, expires_at, now) == TokenState::Usable
}

/// Validate the answers of a public submission.
pub fn validate_answers(departure_reason: &str, likelihood_to_recommend: i32) -> Result<(), String> {
    if departure_reason.trim().is_empty() {
        return Err("departure_reason must not be empty".to_string());
    }
    if !(MIN_RECOMMEND_SCORE..=MAX_RECOMMEND_SCORE).contains(&likelihood_to_recommend) {
        return Err(format!(
            "likelihood_to_recommend must be between {MIN_RECOMMEND_SCORE} and {MAX_RECOMMEND_SCORE}"
        ));
    }
    Ok(())
}

/// Public survey link embedding the token.
pub fn survey_link(app_base_url: &str, token: &str) -> String {
    format!("{}/exit-survey/{token}", app_base_url.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// The fields of one survey response that feed the aggregate statistics.
#[derive(Debug, Clone)]
pub struct SurveyAnswer<'a> {
    pub departure_reason: &'a str,
    pub likelihood_to_recommend: i32,
    pub would_return: bool,
}

/// Aggregate statistics over an organization's survey corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyStats {
    pub count: usize,
    pub average_recommend_score: Option<f64>,
    /// Net promoter score in -100..=100 (promoters 9-10, detractors 0-6).
    pub nps: Option<i32>,
    pub would_return_ratio: Option<f64>,
    pub departure_reasons: BTreeMap<String, usize>,
}

impl SurveyStats {
    pub fn compute(answers: &[SurveyAnswer<'_>]) -> Self {
        let count = answers.len();
        let mut departure_reasons = BTreeMap::new();
        for a in answers {
            *departure_reasons
                .entry(a.departure_reason.trim().to_lowercase())
                .or_insert(0) += 1;
        }

        if count == 0 {
            return Self {
                count,
                average_recommend_score: None,
                nps: None,
                would_return_ratio: None,
                departure_reasons,
            };
        }

        let total: i64 = answers
            .iter()
            .map(|a| i64::from(a.likelihood_to_recommend))
            .sum();
        let promoters = answers
            .iter()
            .filter(|a| a.likelihood_to_recommend >= 9)
            .count() as i64;
        let detractors = answers
            .iter()
            .filter(|a| a.likelihood_to_recommend <= 6)
            .count() as i64;
        let returners = answers.iter().filter(|a| a.would_return).count();
        let n = count as i64;

        Self {
            count,
            average_recommend_score: Some(total as f64 / count as f64),
            nps: Some((((promoters - detractors) * 100) / n) as i32),
            would_return_ratio: Some(returners as f64 / count as f64),
            departure_reasons,
        }
    }

    /// Plain-text summary used when no LLM is configured, and as LLM context.
    pub fn describe(&self) -> String {
        if self.count == 0 {
            return "No exit surveys have been submitted yet.".to_string();
        }
        let reasons = self
            .departure_reasons
            .iter()
            .map(|(reason, n)| format!("{reason} ({n})"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} surveys. Average recommend score {:.1}/10, NPS {}. {:.0}% would return. Departure reasons: {}.",
            self.count,
            self.average_recommend_score.unwrap_or_default(),
            self.nps.unwrap_or_default(),
            self.would_return_ratio.unwrap_or_default() * 100.0,
            reasons
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn generated_token_is_alphanumeric_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn expired_and_completed_are_distinct() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        let future = now + Duration::days(1);

        assert_eq!(classify(TOKEN_STATUS_PENDING, future, now), TokenState::Usable);
        assert_eq!(classify(TOKEN_STATUS_PENDING, past, now), TokenState::Expired);
        assert_eq!(
            classify(TOKEN_STATUS_COMPLETED, future, now),
            TokenState::Completed
        );
        assert_eq!(
            classify(TOKEN_STATUS_COMPLETED, past, now),
            TokenState::Completed
        );
        assert_ne!(
            TokenState::Expired.rejection_reason(),
            TokenState::Completed.rejection_reason()
        );
        assert_eq!(TokenState::Usable.rejection_reason(), None);
    }

    #[test]
    fn only_usable_tokens_are_reused() {
        let now = Utc::now();
        assert!(is_reusable(TOKEN_STATUS_PENDING, now + Duration::days(3), now));
        assert!(!is_reusable(TOKEN_STATUS_PENDING, now - Duration::days(3), now));
        assert!(!is_reusable(TOKEN_STATUS_COMPLETED, now + Duration::days(3), now));
    }

    #[test]
    fn expiry_uses_ttl() {
        let now = Utc::now();
        assert_eq!(expiry_from(now, 30) - now, Duration::days(30));
    }

    #[test]
    fn ttl_is_bounded() {
        assert!(validate_ttl_days(DEFAULT_TOKEN_TTL_DAYS).is_ok());
        assert!(validate_ttl_days(MAX_TOKEN_TTL_DAYS).is_ok());
        assert!(validate_ttl_days(0).is_err());
        assert!(validate_ttl_days(MAX_TOKEN_TTL_DAYS + 1).is_err());
        assert!(validate_ttl_days(i64::MAX).is_err());
    }

    #[test]
    fn answers_validation() {
        assert!(validate_answers("Compensation", 7).is_ok());
        assert!(validate_answers("  ", 7).is_err());
        assert!(validate_answers("Growth", 11).is_err());
        assert!(validate_answers("Growth", -1).is_err());
        assert!(validate_answers("Growth", 0).is_ok());
    }

    #[test]
    fn link_trims_trailing_slash() {
        assert_eq!(
            survey_link("https://app.example.com/", "abc"),
            "https://app.example.com/exit-survey/abc"
        );
    }

    #[test]
    fn stats_over_empty_corpus() {
        let stats = SurveyStats::compute(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.nps, None);
        assert!(stats.describe().contains("No exit surveys"));
    }

    #[test]
    fn stats_compute_nps_and_reasons() {
        let answers = [
            SurveyAnswer { departure_reason: "Compensation", likelihood_to_recommend: 10, would_return: true },
            SurveyAnswer { departure_reason: "compensation ", likelihood_to_recommend: 9, would_return: false },
            SurveyAnswer { departure_reason: "Management", likelihood_to_recommend: 3, would_return: false },
            SurveyAnswer { departure_reason: "Relocation", likelihood_to_recommend: 8, would_return: true },
        ];
        let stats = SurveyStats::compute(&answers);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.average_recommend_score, Some(7.5));
        // 2 promoters, 1 detractor out of 4.
        assert_eq!(stats.nps, Some(25));
        assert_eq!(stats.would_return_ratio, Some(0.5));
        assert_eq!(stats.departure_reasons.get("compensation"), Some(&2));
        assert!(stats.describe().starts_with("4 surveys."));
    }
}
