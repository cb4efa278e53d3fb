//! Route definitions for scheduler-triggered jobs.

use axum::routing::get;
use axum::Router;

use crate::handlers::cron;
use crate::state::AppState;

/// Routes mounted at `/cron`.
pub fn router() -> Router<AppState> {
    Router::new().route("/check-trials", get(cron::check_trials))
}
