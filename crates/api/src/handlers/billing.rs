//! Paddle billing webhook.
//!
//! Only signature and parse failures are reported back to Paddle. Once an
//! event is accepted, reconciliation errors are logged and the endpoint still
//! answers `200 { received: true }` so Paddle does not retry forever.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use offboardpro_core::billing::{verify_signature, BillingAction, PaddleEvent, SIGNATURE_HEADER};
use offboardpro_core::error::CoreError;
use offboardpro_core::types::Timestamp;
use offboardpro_db::models::user::User;
use offboardpro_db::repositories::SubscriptionRepo;
use offboardpro_db::DbPool;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/paddle/webhook
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    if let Some(secret) = state.config.paddle_webhook_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing webhook signature".into()))
            })?;
        verify_signature(secret, header, &body, Utc::now().timestamp()).map_err(|e| {
            tracing::warn!(error = %e, "Rejected Paddle webhook");
            AppError::Core(CoreError::Unauthorized("Invalid webhook signature".into()))
        })?;
    }

    let event = PaddleEvent::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    let now = Utc::now();
    let event_at = event.occurred_at.unwrap_or(now);

    match event.action() {
        Ok(action) => {
            let event_type = event.event_type.as_str();
            match reconcile(&state.pool, &action, event_at, now).await {
                Ok(Some(user)) => tracing::info!(
                    event_type,
                    event_id = event.event_id.as_deref(),
                    user_id = user.id,
                    status = user.subscription_status.as_deref(),
                    "Subscription reconciled"
                ),
                Ok(None) => tracing::info!(
                    event_type,
                    event_id = event.event_id.as_deref(),
                    "Webhook matched no user or was stale"
                ),
                Err(e) => tracing::error!(
                    event_type,
                    event_id = event.event_id.as_deref(),
                    error = %e,
                    "Failed to reconcile webhook"
                ),
            }
        }
        Err(e) => tracing::warn!(
            event_type = %event.event_type,
            error = %e,
            "Unusable webhook event"
        ),
    }

    Ok(Json(json!({ "received": true })))
}

/// Apply one billing action. `None` means nothing was written.
async fn reconcile(
    pool: &DbPool,
    action: &BillingAction,
    event_at: Timestamp,
    now: Timestamp,
) -> Result<Option<User>, sqlx::Error> {
    match action {
        BillingAction::SubscriptionCreated {
            user_id,
            subscription_id,
            customer_id,
            status,
            plan,
            trial_ends_at,
        } => {
            SubscriptionRepo::apply_created(
                pool,
                *user_id,
                subscription_id,
                customer_id.as_deref(),
                status,
                *plan,
                *trial_ends_at,
                event_at,
            )
            .await
        }
        BillingAction::SubscriptionUpdated {
            subscription_id,
            status,
            plan,
        } => SubscriptionRepo::apply_updated(pool, subscription_id, status, *plan, event_at).await,
        BillingAction::SubscriptionCanceled { subscription_id } => {
            SubscriptionRepo::apply_canceled(pool, subscription_id, now, event_at).await
        }
        BillingAction::TransactionCompleted { subscription_id } => {
            SubscriptionRepo::apply_transaction_completed(pool, subscription_id, event_at).await
        }
        BillingAction::Ignored { event_type } => {
            tracing::debug!(event_type = %event_type, "Ignoring webhook event");
            Ok(None)
        }
    }
}
