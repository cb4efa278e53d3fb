//! Paddle billing webhook model and signature verification.
//!
//! Events are parsed into a [`PaddleEvent`] envelope and reduced to a
//! [`BillingAction`] describing the single upsert the reconciler performs.
//! Parsing is separate from persistence so the mapping can be tested
//! without a database.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::entitlements::Plan;
use crate::hashing::{constant_time_eq, hex_encode};
use crate::types::{DbId, Timestamp};

pub const EVENT_SUBSCRIPTION_CREATED: &str = "subscription.created";
pub const EVENT_SUBSCRIPTION_UPDATED: &str = "subscription.updated";
pub const EVENT_SUBSCRIPTION_CANCELED: &str = "subscription.canceled";
pub const EVENT_TRANSACTION_COMPLETED: &str = "transaction.completed";

/// Name of the header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "paddle-signature";

/// Maximum accepted age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("Event is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Event field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature header is malformed")]
    Malformed,

    #[error("Signature timestamp is outside the accepted window")]
    Stale,

    #[error("Signature does not match payload")]
    Mismatch,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The outer shape of every Paddle notification.
#[derive(Debug, Clone, Deserialize)]
pub struct PaddleEvent {
    pub event_type: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<Timestamp>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The single write the reconciler performs for an event.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingAction {
    /// Keyed by the user id carried in `data.custom_data.userId`.
    SubscriptionCreated {
        user_id: DbId,
        subscription_id: String,
        customer_id: Option<String>,
        status: String,
        plan: Plan,
        trial_ends_at: Option<Timestamp>,
    },
    /// Keyed by `data.id`.
    SubscriptionUpdated {
        subscription_id: String,
        status: String,
        plan: Option<Plan>,
    },
    /// Keyed by `data.id`.
    SubscriptionCanceled { subscription_id: String },
    /// Keyed by `data.subscription_id`.
    TransactionCompleted { subscription_id: String },
    /// Event type the reconciler does not handle.
    Ignored { event_type: String },
}

impl PaddleEvent {
    /// Parse a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Reduce the event to the write it implies.
    pub fn action(&self) -> Result<BillingAction, BillingError> {
        match self.event_type.as_str() {
            EVENT_SUBSCRIPTION_CREATED => Ok(BillingAction::SubscriptionCreated {
                user_id: self.custom_user_id()?,
                subscription_id: self.str_field("id")?,
                customer_id: self.data["customer_id"].as_str().map(str::to_string),
                status: self.str_field("status")?,
                plan: self.plan().unwrap_or(Plan::Starter),
                trial_ends_at: self.trial_ends_at(),
            }),
            EVENT_SUBSCRIPTION_UPDATED => Ok(BillingAction::SubscriptionUpdated {
                subscription_id: self.str_field("id")?,
                status: self.str_field("status")?,
                plan: self.plan(),
            }),
            EVENT_SUBSCRIPTION_CANCELED => Ok(BillingAction::SubscriptionCanceled {
                subscription_id: self.str_field("id")?,
            }),
            EVENT_TRANSACTION_COMPLETED => Ok(BillingAction::TransactionCompleted {
                subscription_id: self.str_field("subscription_id")?,
            }),
            other => Ok(BillingAction::Ignored {
                event_type: other.to_string(),
            }),
        }
    }

    fn str_field(&self, field: &'static str) -> Result<String, BillingError> {
        self.data[field]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(BillingError::MissingField(field))
    }

    /// `custom_data.userId` may arrive as a JSON number or a numeric string.
    fn custom_user_id(&self) -> Result<DbId, BillingError> {
        let raw = &self.data["custom_data"]["userId"];
        if let Some(id) = raw.as_i64() {
            return Ok(id);
        }
        let text = raw
            .as_str()
            .ok_or(BillingError::MissingField("custom_data.userId"))?;
        text.trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| BillingError::InvalidField {
                field: "custom_data.userId",
                reason: e.to_string(),
            })
    }

    /// Plan from subscription-level `custom_data.plan`, else from the first
    /// item's price `custom_data.plan`, else from the price name.
    fn plan(&self) -> Option<Plan> {
        let item_price = &self.data["items"][0]["price"];
        [
            self.data["custom_data"]["plan"].as_str(),
            item_price["custom_data"]["plan"].as_str(),
            item_price["name"].as_str(),
        ]
        .into_iter()
        .flatten()
        .find_map(plan_from_label)
    }

    fn trial_ends_at(&self) -> Option<Timestamp> {
        let raw = self.data["items"][0]["trial_dates"]["ends_at"].as_str()?;
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

/// Plan the organization runs on given its owner's subscription state.
/// Only a live subscription carries its plan; anything else is starter.
pub fn organization_plan(status: &str, plan: Plan) -> Plan {
    match status {
        "active" | "trialing" | "past_due" => plan,
        _ => Plan::Starter,
    }
}

/// Map a plan name or a product label such as "Professional Monthly".
fn plan_from_label(label: &str) -> Option<Plan> {
    if let Ok(plan) = label.parse() {
        return Some(plan);
    }
    label
        .split_whitespace()
        .find_map(|word| word.parse::<Plan>().ok())
}

// ---------------------------------------------------------------------------
// Signature verification
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

/// Compute the `h1` signature over `"{ts}:{body}"`.
pub fn compute_signature(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b":");
    mac.update(body);
    hex_encode(mac.finalize().into_bytes())
}

/// Verify a `ts=...;h1=...` signature header against the raw body.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &[u8],
    now_unix: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(';') {
        match part.trim().split_once('=') {
            Some(("ts", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("h1", v)) => signatures.push(v),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    let skew = now_unix
        .checked_sub(timestamp)
        .map(i64::unsigned_abs)
        .ok_or(SignatureError::Stale)?;
    if skew > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::Stale);
    }

    let expected = compute_signature(secret, timestamp, body);
    if signatures.iter().any(|sig| constant_time_eq(sig, &expected)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
