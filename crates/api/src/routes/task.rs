//! Route definitions for the `/tasks` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/complete", post(task::complete))
}
