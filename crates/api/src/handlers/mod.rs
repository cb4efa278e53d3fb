pub mod auth;
pub mod billing;
pub mod cron;
pub mod exit_survey;
pub mod notification;
pub mod offboarding;
pub mod organization;
pub mod security;
pub mod task;
pub mod template;

use offboardpro_core::error::CoreError;
use offboardpro_events::{BackgroundJob, QueueError};

use crate::error::AppError;
use crate::state::AppState;

/// Map a core validation message into a 400 response.
pub(crate) fn validation(msg: String) -> AppError {
    AppError::Core(CoreError::Validation(msg))
}

/// Submit a side-effect job. A rejected submission is logged here; callers
/// decide whether to surface it.
pub(crate) fn submit_job(state: &AppState, job: BackgroundJob) -> Result<(), QueueError> {
    let kind = job.kind();
    state.jobs.submit(job).inspect_err(|e| {
        tracing::warn!(job = kind, error = %e, "Failed to queue background job");
    })
}
