//! Handlers for the `/templates` resource.
//!
//! Templates are either global defaults (no organization) or owned by one
//! organization. Listing and reads see both; creation always targets the
//! caller's organization.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use offboardpro_core::entitlements::within_limit;
use offboardpro_core::error::CoreError;
use offboardpro_core::offboarding::{validate_due_offset, validate_priority};
use offboardpro_core::types::DbId;
use offboardpro_core::validation::require_non_empty;
use offboardpro_db::models::template::{CreateTemplate, TemplateWithTasks};
use offboardpro_db::repositories::TemplateRepo;

use super::validation;
use crate::error::{AppError, AppResult};
use crate::middleware::org::OrgMember;
use crate::middleware::rbac::RequireTemplateAuthor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/templates
pub async fn list(
    member: OrgMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<TemplateWithTasks>>>> {
    let templates =
        TemplateRepo::list_visible_with_tasks(&state.pool, member.organization_id()).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// GET /api/templates/{id}
pub async fn get(
    member: OrgMember,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TemplateWithTasks>>> {
    let template = TemplateRepo::find_visible(&state.pool, id, member.organization_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Template",
            id,
        }))?;
    Ok(Json(DataResponse { data: template }))
}

/// POST /api/templates
///
/// Create an organization template with its ordered tasks. Subject to the
/// plan's template cap.
pub async fn create(
    RequireTemplateAuthor(member): RequireTemplateAuthor,
    State(state): State<AppState>,
    Json(input): Json<CreateTemplate>,
) -> AppResult<(StatusCode, Json<DataResponse<TemplateWithTasks>>)> {
    validate_template(&input)?;

    let org_id = member.organization_id();
    let existing = TemplateRepo::count_for_organization(&state.pool, org_id).await?;
    if !within_limit(member.limits().max_templates, existing) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Template limit reached for the {} plan",
            member.plan()
        ))));
    }

    let template =
        TemplateRepo::create_with_tasks(&state.pool, org_id, member.user_id(), &input).await?;

    tracing::info!(
        template_id = template.template.id,
        organization_id = org_id,
        tasks = template.tasks.len(),
        "Template created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

fn validate_template(input: &CreateTemplate) -> AppResult<()> {
    require_non_empty("name", &input.name).map_err(validation)?;
    if input.tasks.is_empty() {
        return Err(validation("A template needs at least one task".into()));
    }
    for task in &input.tasks {
        require_non_empty("task name", &task.name).map_err(validation)?;
        require_non_empty("task department", &task.department).map_err(validation)?;
        validate_priority(&task.priority).map_err(validation)?;
        validate_due_offset(task.due_offset_days).map_err(validation)?;
    }
    Ok(())
}
