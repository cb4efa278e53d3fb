//! Survey token, exit survey, and survey analysis models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use offboardpro_core::types::{Date, DbId, Timestamp};

/// A row from the `survey_tokens` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SurveyToken {
    pub id: DbId,
    pub token: String,
    pub offboarding_id: DbId,
    pub organization_id: DbId,
    pub employee_email: String,
    pub employee_name: String,
    pub status: String,
    pub expires_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Token fields safe to show to an unauthenticated survey taker.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSurveyToken {
    pub employee_name: String,
    pub employee_email: String,
    pub status: String,
    pub expires_at: Timestamp,
}

impl From<&SurveyToken> for PublicSurveyToken {
    fn from(t: &SurveyToken) -> Self {
        Self {
            employee_name: t.employee_name.clone(),
            employee_email: t.employee_email.clone(),
            status: t.status.clone(),
            expires_at: t.expires_at,
        }
    }
}

/// Read-only view of the offboarding shown on the public survey page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OffboardingSnapshot {
    pub employee_name: String,
    pub department: Option<String>,
    pub role_title: Option<String>,
    pub last_working_day: Date,
}

/// Issuance parameters for a survey token.
#[derive(Debug, Clone)]
pub struct IssueToken {
    pub offboarding_id: DbId,
    pub organization_id: DbId,
    pub employee_email: String,
    pub employee_name: String,
    pub ttl_days: i64,
}

/// A row from the `exit_surveys` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExitSurvey {
    pub id: DbId,
    pub offboarding_id: DbId,
    pub organization_id: DbId,
    pub survey_token_id: Option<DbId>,
    pub departure_reason: String,
    pub likelihood_to_recommend: i32,
    pub would_return: bool,
    pub would_return_reason: Option<String>,
    pub suggestions: Option<String>,
    pub submitted_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// Answers of a public survey submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyAnswers {
    pub departure_reason: String,
    pub likelihood_to_recommend: i32,
    #[serde(default)]
    pub would_return: bool,
    pub would_return_reason: Option<String>,
    pub suggestions: Option<String>,
}

/// A row from the `survey_analyses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SurveyAnalysis {
    pub id: DbId,
    pub organization_id: DbId,
    pub survey_count: i32,
    pub average_recommend_score: Option<f64>,
    pub nps: Option<i32>,
    pub statistics: serde_json::Value,
    pub summary: String,
    pub model: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for storing an analysis result.
#[derive(Debug, Clone)]
pub struct CreateSurveyAnalysis {
    pub organization_id: DbId,
    pub survey_count: i32,
    pub average_recommend_score: Option<f64>,
    pub nps: Option<i32>,
    pub statistics: serde_json::Value,
    pub summary: String,
    pub model: Option<String>,
}
