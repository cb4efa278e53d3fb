//! OffboardPro background side effects.
//!
//! Request handlers never perform email delivery or survey analysis inline.
//! They submit a [`BackgroundJob`] to the [`JobQueue`]; a single
//! [`JobWorker`] task executes jobs with exponential-backoff retry.
//!
//! - [`delivery`] - SMTP email transport.
//! - [`messages`] - transactional email builders.
//! - [`analysis`] - exit-survey corpus analysis (LLM or statistics only).
//! - [`queue`] - the job queue and worker.

pub mod analysis;
pub mod delivery;
pub mod messages;
pub mod queue;

pub use analysis::{AnalysisConfig, AnalysisError, SurveyAnalyzer};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use messages::EmailMessage;
pub use queue::{BackgroundJob, JobQueue, JobWorker, QueueError};
