//! Route definitions for exit surveys.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::exit_survey;
use crate::state::AppState;

/// Routes mounted at `/exit-survey`.
///
/// ```text
/// POST /create-token    -> create_token (requires auth)
/// POST /validate-token  -> validate_token (public)
/// POST /submit          -> submit (public)
/// POST /analyze         -> analyze (requires ai_insights)
/// GET  /analysis        -> latest_analysis
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-token", post(exit_survey::create_token))
        .route("/validate-token", post(exit_survey::validate_token))
        .route("/submit", post(exit_survey::submit))
        .route("/analyze", post(exit_survey::analyze))
        .route("/analysis", get(exit_survey::latest_analysis))
}

/// Routes mounted at `/exit-surveys`.
pub fn list_router() -> Router<AppState> {
    Router::new().route("/", get(exit_survey::list))
}
