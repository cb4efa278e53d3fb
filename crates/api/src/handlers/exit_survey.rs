//! Handlers for exit-survey tokens, public submissions and analysis.
//!
//! `validate-token` and `submit` are public: the token is the credential.
//! Their rejections use a `{ valid: false, reason }` body so the survey page
//! can show the reason verbatim.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use offboardpro_core::entitlements::{limits_for, Feature};
use offboardpro_core::error::CoreError;
use offboardpro_core::survey::{classify, validate_answers, REASON_EXPIRED, REASON_UNKNOWN};
use offboardpro_core::types::DbId;
use offboardpro_core::validation::{normalize_email, require_non_empty, validate_email};
use offboardpro_db::models::survey::{
    ExitSurvey, IssueToken, PublicSurveyToken, SurveyAnalysis, SurveyAnswers,
};
use offboardpro_db::repositories::{
    ExitSurveyRepo, OrganizationRepo, SubmitOutcome, SurveyAnalysisRepo, SurveyTokenRepo,
};
use offboardpro_events::BackgroundJob;
use serde::Deserialize;
use serde_json::json;

use super::{submit_job, validation};
use crate::error::{AppError, AppResult};
use crate::middleware::org::OrgMember;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /exit-survey/create-token`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    pub offboarding_id: Option<DbId>,
    /// Optional; when present it must be the caller's organization.
    pub organization_id: Option<DbId>,
    pub employee_email: Option<String>,
    pub employee_name: Option<String>,
}

/// Request body for `POST /exit-survey/validate-token`.
#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    #[serde(default)]
    pub token: String,
}

/// Request body for `POST /exit-survey/submit`.
#[derive(Debug, Deserialize)]
pub struct SubmitSurveyRequest {
    #[serde(default)]
    pub token: String,
    #[serde(flatten)]
    pub answers: SurveyAnswers,
}

// ---------------------------------------------------------------------------
// Token issuance and validation
// ---------------------------------------------------------------------------

/// POST /api/exit-survey/create-token
///
/// Return the live token of the offboarding, or replace an expired or
/// consumed one with a fresh token.
pub async fn create_token(
    member: OrgMember,
    State(state): State<AppState>,
    Json(input): Json<CreateTokenRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let (Some(offboarding_id), Some(employee_email), Some(employee_name)) = (
        input.offboarding_id,
        input.employee_email.as_deref(),
        input.employee_name.as_deref(),
    ) else {
        return Err(AppError::BadRequest(
            "offboardingId, employeeEmail and employeeName are required".into(),
        ));
    };
    let employee_name = require_non_empty("employeeName", employee_name).map_err(validation)?;
    let employee_email = normalize_email(employee_email);
    validate_email(&employee_email).map_err(validation)?;

    let org_id = member.organization_id();
    if input.organization_id.is_some_and(|id| id != org_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot issue survey tokens for another organization".into(),
        )));
    }

    let issue = IssueToken {
        offboarding_id,
        organization_id: org_id,
        employee_email,
        employee_name: employee_name.to_string(),
        ttl_days: state.config.survey_token_ttl_days,
    };
    let issued = SurveyTokenRepo::create_or_reuse(&state.pool, org_id, &issue, Utc::now())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Offboarding",
            id: offboarding_id,
        }))?;

    tracing::info!(
        offboarding_id,
        fresh = issued.fresh,
        "Survey token issued"
    );

    Ok(Json(json!({
        "success": true,
        "token": issued.token.token,
        "expiresAt": issued.token.expires_at,
    })))
}

/// POST /api/exit-survey/validate-token
///
/// Read-only check of a survey link. Never mutates the token.
pub async fn validate_token(
    State(state): State<AppState>,
    Json(input): Json<ValidateTokenRequest>,
) -> AppResult<Response> {
    let token = input.token.trim();
    if token.is_empty() {
        return Ok(rejection(StatusCode::BAD_REQUEST, "Survey token is required"));
    }

    let Some(survey_token) = SurveyTokenRepo::find_by_token(&state.pool, token).await? else {
        return Ok(rejection(StatusCode::NOT_FOUND, REASON_UNKNOWN));
    };

    let token_state = classify(&survey_token.status, survey_token.expires_at, Utc::now());
    if let Some(reason) = token_state.rejection_reason() {
        return Ok(rejection(StatusCode::BAD_REQUEST, reason));
    }

    let offboarding = SurveyTokenRepo::snapshot(&state.pool, survey_token.offboarding_id).await?;

    Ok(Json(json!({
        "valid": true,
        "surveyToken": PublicSurveyToken::from(&survey_token),
        "offboarding": offboarding,
    }))
    .into_response())
}

/// POST /api/exit-survey/submit
///
/// Store the answers and consume the token, exactly once.
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitSurveyRequest>,
) -> AppResult<Response> {
    let token = input.token.trim();
    if token.is_empty() {
        return Ok(rejection(StatusCode::BAD_REQUEST, "Survey token is required"));
    }
    validate_answers(
        &input.answers.departure_reason,
        input.answers.likelihood_to_recommend,
    )
    .map_err(validation)?;

    let outcome = SurveyTokenRepo::submit(&state.pool, token, &input.answers, Utc::now()).await?;

    let survey = match outcome {
        SubmitOutcome::Submitted { survey, .. } => survey,
        SubmitOutcome::UnknownToken => {
            return Ok(rejection(StatusCode::NOT_FOUND, REASON_UNKNOWN));
        }
        SubmitOutcome::Rejected(token_state) => {
            let reason = token_state.rejection_reason().unwrap_or(REASON_EXPIRED);
            return Ok(rejection(StatusCode::BAD_REQUEST, reason));
        }
    };

    tracing::info!(
        survey_id = survey.id,
        offboarding_id = survey.offboarding_id,
        "Exit survey submitted"
    );

    if analysis_enabled(&state, survey.organization_id).await {
        let _ = submit_job(
            &state,
            BackgroundJob::AnalyzeSurveys {
                organization_id: survey.organization_id,
            },
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "surveyId": survey.id })),
    )
        .into_response())
}

/// Whether the organization's plan includes AI insights. Lookup failures
/// count as "no"; the submission itself already succeeded.
async fn analysis_enabled(state: &AppState, organization_id: DbId) -> bool {
    match OrganizationRepo::find_by_id(&state.pool, organization_id).await {
        Ok(Some(org)) => {
            limits_for(Some(org.subscription_plan.as_str())).allows(Feature::AiInsights)
        }
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(organization_id, error = %e, "Failed to load plan for survey analysis");
            false
        }
    }
}

fn rejection(status: StatusCode, reason: &str) -> Response {
    (status, Json(json!({ "valid": false, "reason": reason }))).into_response()
}

// ---------------------------------------------------------------------------
// Organization views
// ---------------------------------------------------------------------------

/// GET /api/exit-surveys
pub async fn list(
    member: OrgMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ExitSurvey>>>> {
    let surveys = ExitSurveyRepo::list_for_organization(&state.pool, member.organization_id()).await?;
    Ok(Json(DataResponse { data: surveys }))
}

/// POST /api/exit-survey/analyze
///
/// Queue an analysis of the organization's survey corpus. Requires the
/// `ai_insights` entitlement.
pub async fn analyze(
    member: OrgMember,
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if !member.limits().allows(Feature::AiInsights) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "AI insights are not included in the {} plan",
            member.plan()
        ))));
    }

    submit_job(
        &state,
        BackgroundJob::AnalyzeSurveys {
            organization_id: member.organization_id(),
        },
    )
    .map_err(|e| AppError::InternalError(format!("Failed to queue survey analysis: {e}")))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "success": true, "message": "Survey analysis queued" })),
    ))
}

/// GET /api/exit-survey/analysis
pub async fn latest_analysis(
    member: OrgMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SurveyAnalysis>>> {
    let org_id = member.organization_id();
    let analysis = SurveyAnalysisRepo::latest(&state.pool, org_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SurveyAnalysis for organization",
            id: org_id,
        }))?;
    Ok(Json(DataResponse { data: analysis }))
}
