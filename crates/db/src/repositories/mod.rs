//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Operations whose dependent writes
//! must land together open their own transaction and report the result as
//! an outcome enum instead of an error.

pub mod exit_survey_repo;
pub mod notification_repo;
pub mod oauth_connection_repo;
pub mod offboarding_repo;
pub mod organization_repo;
pub mod session_repo;
pub mod subscription_repo;
pub mod survey_analysis_repo;
pub mod survey_token_repo;
pub mod task_repo;
pub mod template_repo;
pub mod user_repo;

pub use exit_survey_repo::ExitSurveyRepo;
pub use notification_repo::NotificationRepo;
pub use oauth_connection_repo::{OAuthConnectionRepo, RevokeOutcome};
pub use offboarding_repo::{FinalizeOutcome, OffboardingRepo};
pub use organization_repo::{OrganizationRepo, OrganizationSetup};
pub use session_repo::SessionRepo;
pub use subscription_repo::SubscriptionRepo;
pub use survey_analysis_repo::SurveyAnalysisRepo;
pub use survey_token_repo::{IssuedToken, SubmitOutcome, SurveyTokenRepo};
pub use task_repo::{TaskCompletion, TaskRepo};
pub use template_repo::TemplateRepo;
pub use user_repo::UserRepo;
