//! Route definitions for the Paddle webhook.

use axum::routing::post;
use axum::Router;

use crate::handlers::billing;
use crate::state::AppState;

/// Routes mounted at `/paddle`.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(billing::webhook))
}
