//! Background job queue with retry.
//!
//! [`JobQueue`] is the cheap, cloneable submission handle kept in the API
//! state. [`JobWorker`] owns the receiving end and runs each job in its own
//! task, at most [`DEFAULT_MAX_CONCURRENT_JOBS`] at a time, so a job stuck in
//! its retries does not hold back the others. A failed job is retried after
//! each of [`RETRY_DELAYS_SECS`] and dropped with an error log once the
//! retries are exhausted.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use offboardpro_core::types::DbId;
use offboardpro_db::DbPool;

use crate::analysis::{AnalysisError, SurveyAnalyzer};
use crate::delivery::email::{EmailDelivery, EmailError};
use crate::messages::EmailMessage;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
pub const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// Default bound of the submission channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default number of jobs a worker executes at once.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 8;

/// A unit of deferred work.
#[derive(Debug, Clone)]
pub enum BackgroundJob {
    SendEmail(EmailMessage),
    AnalyzeSurveys { organization_id: DbId },
}

impl BackgroundJob {
    pub fn kind(&self) -> &'static str {
        match self {
            BackgroundJob::SendEmail(_) => "send_email",
            BackgroundJob::AnalyzeSurveys { .. } => "analyze_surveys",
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Submission failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job queue is full")]
    Full,

    #[error("Job queue is closed")]
    Closed,
}

/// Execution failure of a single attempt.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

// ---------------------------------------------------------------------------
// JobQueue
// ---------------------------------------------------------------------------

/// Submission handle for background jobs.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<BackgroundJob>,
}

impl JobQueue {
    /// Create a queue and the receiver to hand to a [`JobWorker`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BackgroundJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Enqueue a job without waiting for capacity.
    pub fn submit(&self, job: BackgroundJob) -> Result<(), QueueError> {
        let kind = job.kind();
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;
        tracing::debug!(job = kind, "Background job queued");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JobWorker
// ---------------------------------------------------------------------------

/// Executes background jobs.
pub struct JobWorker {
    pool: DbPool,
    email: Option<EmailDelivery>,
    analyzer: SurveyAnalyzer,
}

impl JobWorker {
    pub fn new(pool: DbPool, email: Option<EmailDelivery>, analyzer: SurveyAnalyzer) -> Self {
        Self {
            pool,
            email,
            analyzer,
        }
    }

    /// Run the worker loop until cancelled or until every [`JobQueue`] handle
    /// is dropped. On cancellation, jobs already queued are drained first.
    pub async fn run(self, receiver: mpsc::Receiver<BackgroundJob>, cancel: CancellationToken) {
        let delays = RETRY_DELAYS_SECS.map(Duration::from_secs).to_vec();
        let worker = Arc::new(self);
        dispatch(receiver, cancel, DEFAULT_MAX_CONCURRENT_JOBS, delays, move |job| {
            let worker = Arc::clone(&worker);
            async move { worker.execute(&job).await }
        })
        .await;
    }

    async fn execute(&self, job: &BackgroundJob) -> Result<(), JobError> {
        match job {
            BackgroundJob::SendEmail(message) => match &self.email {
                Some(delivery) => Ok(delivery.send(message).await?),
                None => {
                    tracing::info!(
                        to = %message.to,
                        subject = %message.subject,
                        "SMTP not configured, email skipped"
                    );
                    Ok(())
                }
            },
            BackgroundJob::AnalyzeSurveys { organization_id } => {
                self.analyzer.analyze(&self.pool, *organization_id).await?;
                Ok(())
            }
        }
    }
}

/// Receive jobs and run each through `execute` with retry, in its own task.
///
/// Receiving pauses while `max_concurrent` jobs are in flight. Returns once
/// the channel is closed or `cancel` fires, after every started job and every
/// job still queued at cancellation has finished.
pub async fn dispatch<F, Fut, E>(
    mut receiver: mpsc::Receiver<BackgroundJob>,
    cancel: CancellationToken,
    max_concurrent: usize,
    delays: Vec<Duration>,
    execute: F,
) where
    F: Fn(BackgroundJob) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let max_concurrent = max_concurrent.max(1);
    let execute = Arc::new(execute);
    let permits = Arc::new(Semaphore::new(max_concurrent));
    let delays: Arc<[Duration]> = delays.into();

    let cancelled = loop {
        tokio::select! {
            _ = cancel.cancelled() => break true,
            job = receiver.recv() => match job {
                Some(job) => spawn_job(&permits, &execute, &delays, job).await,
                None => {
                    tracing::info!("Job queue closed, worker shutting down");
                    break false;
                }
            }
        }
    };

    if cancelled {
        receiver.close();
        let mut drained = 0usize;
        while let Some(job) = receiver.recv().await {
            spawn_job(&permits, &execute, &delays, job).await;
            drained += 1;
        }
        tracing::info!(drained, "Job worker cancelled");
    }

    // Every running job holds a permit until it finishes.
    let _all = permits.acquire_many(max_concurrent as u32).await;
}

async fn spawn_job<F, Fut, E>(
    permits: &Arc<Semaphore>,
    execute: &Arc<F>,
    delays: &Arc<[Duration]>,
    job: BackgroundJob,
) where
    F: Fn(BackgroundJob) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let Ok(permit) = Arc::clone(permits).acquire_owned().await else {
        return;
    };
    let execute = Arc::clone(execute);
    let delays = Arc::clone(delays);
    tokio::spawn(async move {
        let kind = job.kind();
        if let Err(e) = with_retry(kind, &delays, || (*execute)(job.clone())).await {
            tracing::error!(job = kind, error = %e, "Background job failed after all retries");
        }
        drop(permit);
    });
}

/// Run `attempt` once, then once more after each delay while it keeps failing.
pub async fn with_retry<F, Fut, E>(label: &str, delays: &[Duration], mut attempt: F) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    for (i, delay) in delays.iter().enumerate() {
        match attempt().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    job = label,
                    attempt = i + 1,
                    error = %e,
                    "Background job attempt failed, retrying"
                );
                tokio::time::sleep(*delay).await;
            }
        }
    }
    attempt().await
}
