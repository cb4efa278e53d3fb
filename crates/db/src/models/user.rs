//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use offboardpro_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub organization_id: Option<DbId>,
    pub is_active: bool,
    pub subscription_status: Option<String>,
    pub subscription_plan: Option<String>,
    pub paddle_subscription_id: Option<String>,
    pub paddle_customer_id: Option<String>,
    pub trial_ends_at: Option<Timestamp>,
    pub subscription_canceled_at: Option<Timestamp>,
    pub subscription_event_at: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub role: String,
    pub organization_id: Option<DbId>,
    pub subscription_status: Option<String>,
    pub subscription_plan: Option<String>,
    pub trial_ends_at: Option<Timestamp>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            organization_id: user.organization_id,
            subscription_status: user.subscription_status.clone(),
            subscription_plan: user.subscription_plan.clone(),
            trial_ends_at: user.trial_ends_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
}
