//! Handlers for the `/offboardings` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use offboardpro_core::entitlements::within_limit;
use offboardpro_core::error::CoreError;
use offboardpro_core::offboarding::{
    month_start, task_due_date, validate_status, OffboardingStatus,
};
use offboardpro_core::survey::survey_link;
use offboardpro_core::types::DbId;
use offboardpro_core::validation::{normalize_email, require_non_empty, validate_email};
use offboardpro_db::models::offboarding::{
    CreateOffboarding, NewTask, OffboardingDetail, OffboardingSummary,
};
use offboardpro_db::repositories::{FinalizeOutcome, OffboardingRepo, TaskRepo, TemplateRepo};
use offboardpro_events::messages::survey_invitation;
use offboardpro_events::BackgroundJob;
use serde_json::json;

use super::{submit_job, validation};
use crate::error::{AppError, AppResult};
use crate::middleware::org::OrgMember;
use crate::query::StatusFilter;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Offboarding",
        id,
    })
}

/// POST /api/offboardings
///
/// Start an offboarding from a template. Every template task is copied into
/// a task of the new offboarding, due `due_offset_days` after today.
pub async fn create(
    member: OrgMember,
    State(state): State<AppState>,
    Json(input): Json<CreateOffboarding>,
) -> AppResult<(StatusCode, Json<DataResponse<OffboardingDetail>>)> {
    let employee_name = require_non_empty("employee_name", &input.employee_name)
        .map_err(validation)?
        .to_string();
    let employee_email = normalize_email(&input.employee_email);
    validate_email(&employee_email).map_err(validation)?;
    let template_id = input
        .template_id
        .ok_or_else(|| validation("template_id is required".into()))?;

    let org_id = member.organization_id();
    let now = Utc::now();

    let created_this_month =
        OffboardingRepo::count_created_since(&state.pool, org_id, month_start(now)).await?;
    if !within_limit(member.limits().max_offboardings_per_month, created_this_month) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Monthly offboarding limit reached for the {} plan",
            member.plan()
        ))));
    }

    let template = TemplateRepo::find_visible(&state.pool, template_id, org_id)
        .await?
        .filter(|t| t.template.is_active)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Template",
            id: template_id,
        }))?;

    let start = now.date_naive();
    let tasks = template
        .tasks
        .iter()
        .map(|t| {
            Ok(NewTask {
                name: t.name.clone(),
                department: Some(t.department.clone()),
                due_date: Some(task_due_date(start, t.due_offset_days).map_err(validation)?),
                priority: t.priority.clone(),
                order_index: t.order_index,
            })
        })
        .collect::<AppResult<Vec<NewTask>>>()?;

    let record = CreateOffboarding {
        employee_name,
        employee_email,
        department: input.department,
        role_title: input.role_title,
        last_working_day: input.last_working_day,
        template_id: Some(template_id),
    };
    let (offboarding, tasks) =
        OffboardingRepo::create_with_tasks(&state.pool, org_id, member.user_id(), &record, &tasks)
            .await?;

    tracing::info!(
        offboarding_id = offboarding.id,
        organization_id = org_id,
        template_id,
        tasks = tasks.len(),
        "Offboarding created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OffboardingDetail { offboarding, tasks },
        }),
    ))
}

/// GET /api/offboardings?status=
pub async fn list(
    member: OrgMember,
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> AppResult<Json<DataResponse<Vec<OffboardingSummary>>>> {
    if let Some(status) = filter.status.as_deref() {
        validate_status(status).map_err(validation)?;
    }
    let offboardings =
        OffboardingRepo::list(&state.pool, member.organization_id(), filter.status.as_deref())
            .await?;
    Ok(Json(DataResponse { data: offboardings }))
}

/// GET /api/offboardings/{id}
pub async fn get(
    member: OrgMember,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OffboardingDetail>>> {
    let offboarding = OffboardingRepo::find(&state.pool, id, member.organization_id())
        .await?
        .ok_or_else(|| not_found(id))?;
    let tasks = TaskRepo::list_for_offboarding(&state.pool, offboarding.id).await?;
    Ok(Json(DataResponse {
        data: OffboardingDetail { offboarding, tasks },
    }))
}

/// POST /api/offboardings/{id}/cancel
pub async fn cancel(
    member: OrgMember,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OffboardingDetail>>> {
    let org_id = member.organization_id();
    let Some(offboarding) = OffboardingRepo::cancel(&state.pool, id, org_id).await? else {
        let Some(existing) = OffboardingRepo::find(&state.pool, id, org_id).await? else {
            return Err(not_found(id));
        };
        return match OffboardingStatus::parse(&existing.status) {
            Some(status) if status.is_terminal() => Err(AppError::Core(
                CoreError::InvalidState(format!("Offboarding is already {}", status.as_str())),
            )),
            _ => Err(AppError::Core(CoreError::Conflict(
                "Offboarding was modified concurrently, retry the request".into(),
            ))),
        };
    };

    tracing::info!(offboarding_id = id, user_id = member.user_id(), "Offboarding cancelled");

    let tasks = TaskRepo::list_for_offboarding(&state.pool, offboarding.id).await?;
    Ok(Json(DataResponse {
        data: OffboardingDetail { offboarding, tasks },
    }))
}

/// POST /api/offboardings/{id}/finalize
///
/// Complete the offboarding, issue (or reuse) the exit-survey token and
/// queue the invitation email. Repeating the call on a completed offboarding
/// reuses the live token and sends nothing.
pub async fn finalize(
    member: OrgMember,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let outcome = OffboardingRepo::finalize(
        &state.pool,
        id,
        member.organization_id(),
        state.config.survey_token_ttl_days,
        Utc::now(),
    )
    .await?;

    let invite = outcome.needs_invitation();
    let (offboarding, token) = match outcome {
        FinalizeOutcome::Finalized {
            offboarding, token, ..
        } => (offboarding, token),
        FinalizeOutcome::NotFound => return Err(not_found(id)),
        FinalizeOutcome::Cancelled => {
            return Err(AppError::Core(CoreError::InvalidState(
                "Cannot finalize a cancelled offboarding".into(),
            )))
        }
    };

    tracing::info!(
        offboarding_id = offboarding.id,
        user_id = member.user_id(),
        invite,
        "Offboarding finalized"
    );

    if !invite {
        return Ok(Json(json!({
            "success": true,
            "message": "Offboarding was already completed",
            "token_expires_at": token.expires_at,
        })));
    }

    let link = survey_link(&state.config.app_base_url, &token.token);
    let email = survey_invitation(
        &offboarding.employee_email,
        &offboarding.employee_name,
        &link,
        token.expires_at,
    );
    if submit_job(&state, BackgroundJob::SendEmail(email)).is_err() {
        return Ok(Json(json!({
            "success": true,
            "warning": "Offboarding completed but the exit survey email could not be sent",
        })));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Offboarding completed. Exit survey sent to {}",
            offboarding.employee_email
        ),
        "token_expires_at": token.expires_at,
    })))
}
