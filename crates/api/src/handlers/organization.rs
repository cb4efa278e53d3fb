//! Handlers for the `/organization` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use offboardpro_core::entitlements::{Plan, PlanLimits};
use offboardpro_core::error::CoreError;
use offboardpro_core::offboarding::month_start;
use offboardpro_core::trial::trial_end_from;
use offboardpro_core::types::DbId;
use offboardpro_core::validation::require_non_empty;
use offboardpro_db::models::organization::Organization;
use offboardpro_db::repositories::{
    OffboardingRepo, OrganizationRepo, OrganizationSetup, TemplateRepo,
};
use serde::{Deserialize, Serialize};

use super::validation;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::org::OrgMember;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /organization/create`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub organization_name: Option<String>,
    pub user_id: Option<DbId>,
}

/// Current usage against the plan caps.
#[derive(Debug, Serialize)]
pub struct Usage {
    pub users: i64,
    pub offboardings_this_month: i64,
    pub templates: i64,
}

#[derive(Debug, Serialize)]
pub struct EntitlementsResponse {
    pub plan: Plan,
    pub limits: PlanLimits,
    pub usage: Usage,
}

/// POST /api/organization/create
///
/// Create an organization on a 14-day trial and make the caller its admin.
/// `userId` must be the caller.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrganizationRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let (Some(name), Some(user_id)) = (input.organization_name.as_deref(), input.user_id) else {
        return Err(AppError::BadRequest(
            "organizationName and userId are required".into(),
        ));
    };
    let name = require_non_empty("organizationName", name).map_err(validation)?;

    if user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot create an organization for another user".into(),
        )));
    }

    let outcome =
        OrganizationRepo::create_for_user(&state.pool, name, user_id, trial_end_from(Utc::now()))
            .await?;

    match outcome {
        OrganizationSetup::Created { organization, user } => {
            tracing::info!(
                organization_id = organization.id,
                user_id = user.id,
                "Organization created"
            );
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "success": true,
                    "organization": { "id": organization.id, "name": organization.name },
                })),
            ))
        }
        OrganizationSetup::UserNotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })),
        OrganizationSetup::AlreadyMember => Err(AppError::Core(CoreError::Conflict(
            "User already belongs to an organization".into(),
        ))),
    }
}

/// GET /api/organization
pub async fn get(member: OrgMember) -> Json<DataResponse<Organization>> {
    Json(DataResponse {
        data: member.organization,
    })
}

/// GET /api/organization/entitlements
///
/// The organization's plan, its limits, and current usage against them.
pub async fn entitlements(
    member: OrgMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<EntitlementsResponse>>> {
    let org_id = member.organization_id();
    let users = OrganizationRepo::count_users(&state.pool, org_id).await?;
    let offboardings_this_month =
        OffboardingRepo::count_created_since(&state.pool, org_id, month_start(Utc::now()))
            .await?;
    let templates = TemplateRepo::count_for_organization(&state.pool, org_id).await?;

    Ok(Json(DataResponse {
        data: EntitlementsResponse {
            plan: member.plan(),
            limits: member.limits(),
            usage: Usage {
                users,
                offboardings_this_month,
                templates,
            },
        },
    }))
}
