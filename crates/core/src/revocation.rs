//! OAuth connection revocation constants.

pub const CONNECTION_STATUS_ACTIVE: &str = "active";
pub const CONNECTION_STATUS_REVOKED: &str = "revoked";

/// All valid connection status values.
pub const VALID_CONNECTION_STATUSES: &[&str] = &[CONNECTION_STATUS_ACTIVE, CONNECTION_STATUS_REVOKED];

/// Revocation of every active connection in an organization at once.
pub const METHOD_BULK: &str = "bulk";

/// Revocation of a single connection.
pub const METHOD_MANUAL: &str = "manual";

/// Validate a connection status filter value.
pub fn validate_connection_status(status: &str) -> Result<(), String> {
    if VALID_CONNECTION_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_CONNECTION_STATUSES.join(", ")
        ))
    }
}

/// Human-readable result of a bulk revocation.
pub fn revoke_all_message(revoked_count: usize) -> String {
    match revoked_count {
        0 => "No active connections to revoke".to_string(),
        1 => "Revoked 1 connection".to_string(),
        n => format!("Revoked {n} connections"),
    }
}
