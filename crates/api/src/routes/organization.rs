//! Route definitions for the `/organization` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::organization;
use crate::state::AppState;

/// Routes mounted at `/organization`.
///
/// ```text
/// GET  /              -> get
/// POST /create        -> create
/// GET  /entitlements  -> entitlements
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(organization::get))
        .route("/create", post(organization::create))
        .route("/entitlements", get(organization::entitlements))
}
