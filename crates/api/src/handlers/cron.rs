//! Scheduled maintenance endpoints, called by an external scheduler with
//! `Authorization: Bearer $CRON_SECRET`.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, Utc};
use offboardpro_core::error::CoreError;
use offboardpro_core::hashing::constant_time_eq;
use offboardpro_core::trial::{days_remaining, REMINDER_WINDOW_DAYS};
use offboardpro_db::repositories::SubscriptionRepo;
use offboardpro_events::messages::{trial_expired, trial_reminder};
use offboardpro_events::BackgroundJob;
use serde_json::json;

use super::submit_job;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/cron/check-trials
///
/// Expire ended trials (organization falls back to starter), email the
/// affected users, and remind users whose trial ends within
/// [`REMINDER_WINDOW_DAYS`].
pub async fn check_trials(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    authorize(&state, &headers)?;

    let now = Utc::now();
    let mut emails_sent = 0usize;

    let expired = SubscriptionRepo::expire_trials(&state.pool, now).await?;
    for user in &expired {
        let email = trial_expired(&user.email, &user.name);
        if submit_job(&state, BackgroundJob::SendEmail(email)).is_ok() {
            emails_sent += 1;
        }
    }

    let ending =
        SubscriptionRepo::trials_ending_between(&state.pool, now, now + Duration::days(REMINDER_WINDOW_DAYS))
            .await?;
    for user in &ending {
        let Some(trial_ends_at) = user.trial_ends_at else {
            continue;
        };
        let email = trial_reminder(&user.email, &user.name, days_remaining(trial_ends_at, now));
        if submit_job(&state, BackgroundJob::SendEmail(email)).is_ok() {
            emails_sent += 1;
        }
    }

    tracing::info!(
        downgraded = expired.len(),
        reminders = ending.len(),
        emails_sent,
        "Trial check complete"
    );

    Ok(Json(json!({
        "success": true,
        "downgraded": expired.len(),
        "emails_sent": emails_sent,
        "timestamp": now,
    })))
}

/// Without a configured secret every call is rejected.
fn authorize(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    let unauthorized = || AppError::Core(CoreError::Unauthorized("Invalid cron secret".into()));

    let secret = state.config.cron_secret.as_deref().ok_or_else(unauthorized)?;
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    if constant_time_eq(presented.trim(), secret) {
        Ok(())
    } else {
        Err(unauthorized())
    }
}
