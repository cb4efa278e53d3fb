//! Route definitions for the `/security` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::security;
use crate::state::AppState;

/// Routes mounted at `/security`.
///
/// ```text
/// POST /revoke-all                -> revoke_all
/// GET  /connections               -> list_connections (?status=)
/// POST /connections               -> create_connection (admin, it_manager)
/// POST /connections/{id}/revoke   -> revoke_connection (admin, it_manager)
/// GET  /revocation-logs           -> revocation_logs (?limit, offset)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/revoke-all", post(security::revoke_all))
        .route(
            "/connections",
            get(security::list_connections).post(security::create_connection),
        )
        .route("/connections/{id}/revoke", post(security::revoke_connection))
        .route("/revocation-logs", get(security::revocation_logs))
}
