//! Route definitions for the `/offboardings` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::offboarding;
use crate::state::AppState;

/// Routes mounted at `/offboardings`.
///
/// ```text
/// GET  /               -> list (?status=)
/// POST /               -> create
/// GET  /{id}           -> get
/// POST /{id}/cancel    -> cancel
/// POST /{id}/finalize  -> finalize
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(offboarding::list).post(offboarding::create))
        .route("/{id}", get(offboarding::get))
        .route("/{id}/cancel", post(offboarding::cancel))
        .route("/{id}/finalize", post(offboarding::finalize))
}
