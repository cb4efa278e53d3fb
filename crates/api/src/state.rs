use std::sync::Arc;

use offboardpro_events::JobQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and job queue are handles, the config is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: offboardpro_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Submission handle for email and survey-analysis jobs.
    pub jobs: JobQueue,
}
