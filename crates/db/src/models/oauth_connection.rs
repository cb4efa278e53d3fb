//! OAuth connection and revocation audit models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use offboardpro_core::types::{DbId, Timestamp};

/// A row from the `oauth_connections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OAuthConnection {
    pub id: DbId,
    pub organization_id: DbId,
    pub offboarding_id: Option<DbId>,
    pub app_name: String,
    pub employee_email: String,
    pub scopes: Option<String>,
    pub status: String,
    pub revoked_at: Option<Timestamp>,
    pub revoked_by: Option<DbId>,
    pub revocation_method: Option<String>,
    pub version: i32,
    pub created_at: Timestamp,
}

/// DTO for registering a connection.
#[derive(Debug, Deserialize)]
pub struct CreateOAuthConnection {
    pub offboarding_id: Option<DbId>,
    pub app_name: String,
    pub employee_email: String,
    pub scopes: Option<String>,
}

/// A row from the append-only `revocation_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevocationLog {
    pub id: DbId,
    pub connection_id: DbId,
    pub organization_id: DbId,
    pub app_name: String,
    pub employee_email: String,
    pub status_before: String,
    pub status_after: String,
    pub revoked_by: Option<DbId>,
    pub revocation_method: String,
    pub created_at: Timestamp,
}
