//! Handlers for the `/security` resource: OAuth connections and revocation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use offboardpro_core::error::CoreError;
use offboardpro_core::revocation::{
    revoke_all_message, validate_connection_status, METHOD_BULK, METHOD_MANUAL,
};
use offboardpro_core::types::DbId;
use offboardpro_core::validation::{normalize_email, require_non_empty, validate_email};
use offboardpro_db::models::oauth_connection::{
    CreateOAuthConnection, OAuthConnection, RevocationLog,
};
use offboardpro_db::repositories::{OAuthConnectionRepo, OffboardingRepo, RevokeOutcome};
use offboardpro_events::messages::security_alert;
use offboardpro_events::BackgroundJob;
use serde_json::json;

use super::{submit_job, validation};
use crate::error::{AppError, AppResult};
use crate::middleware::org::OrgMember;
use crate::middleware::rbac::RequireSecurityRole;
use crate::query::{PaginationParams, StatusFilter};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/security/revoke-all
///
/// Revoke every active connection of the caller's organization. The update
/// and its audit rows commit together. Requires `admin` or `it_manager`.
pub async fn revoke_all(
    RequireSecurityRole(member): RequireSecurityRole,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let revoked =
        OAuthConnectionRepo::revoke_all(&state.pool, member.organization_id(), member.user_id())
            .await?;
    let revoked_count = revoked.len();

    tracing::info!(
        organization_id = member.organization_id(),
        user_id = member.user_id(),
        revoked_count,
        "Bulk revocation"
    );

    if revoked_count > 0 {
        let alert = security_alert(&member.user.email, revoked_count, METHOD_BULK);
        let _ = submit_job(&state, BackgroundJob::SendEmail(alert));
    }

    Ok(Json(json!({
        "success": true,
        "revokedCount": revoked_count,
        "message": revoke_all_message(revoked_count),
    })))
}

/// GET /api/security/connections?status=
pub async fn list_connections(
    member: OrgMember,
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> AppResult<Json<DataResponse<Vec<OAuthConnection>>>> {
    if let Some(status) = filter.status.as_deref() {
        validate_connection_status(status).map_err(validation)?;
    }
    let connections = OAuthConnectionRepo::list(
        &state.pool,
        member.organization_id(),
        filter.status.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: connections }))
}

/// POST /api/security/connections
///
/// Register an OAuth grant held by an employee.
pub async fn create_connection(
    RequireSecurityRole(member): RequireSecurityRole,
    State(state): State<AppState>,
    Json(input): Json<CreateOAuthConnection>,
) -> AppResult<(StatusCode, Json<DataResponse<OAuthConnection>>)> {
    let app_name = require_non_empty("app_name", &input.app_name).map_err(validation)?;
    let employee_email = normalize_email(&input.employee_email);
    validate_email(&employee_email).map_err(validation)?;

    let org_id = member.organization_id();
    if let Some(offboarding_id) = input.offboarding_id {
        if OffboardingRepo::find(&state.pool, offboarding_id, org_id)
            .await?
            .is_none()
        {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Offboarding",
                id: offboarding_id,
            }));
        }
    }

    let record = CreateOAuthConnection {
        offboarding_id: input.offboarding_id,
        app_name: app_name.to_string(),
        employee_email,
        scopes: input.scopes,
    };
    let connection = OAuthConnectionRepo::create(&state.pool, org_id, &record).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: connection })))
}

/// POST /api/security/connections/{id}/revoke
pub async fn revoke_connection(
    RequireSecurityRole(member): RequireSecurityRole,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let outcome =
        OAuthConnectionRepo::revoke_one(&state.pool, id, member.organization_id(), member.user_id())
            .await?;

    match outcome {
        RevokeOutcome::Revoked(connection) => {
            tracing::info!(
                connection_id = id,
                user_id = member.user_id(),
                app = %connection.app_name,
                "Connection revoked"
            );
            let alert = security_alert(&member.user.email, 1, METHOD_MANUAL);
            let _ = submit_job(&state, BackgroundJob::SendEmail(alert));
            Ok(Json(json!({ "success": true, "connection": connection })))
        }
        RevokeOutcome::AlreadyRevoked => Err(AppError::Core(CoreError::InvalidState(
            "Connection is already revoked".into(),
        ))),
        RevokeOutcome::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Connection",
            id,
        })),
    }
}

/// GET /api/security/revocation-logs?limit=&offset=
pub async fn revocation_logs(
    member: OrgMember,
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<RevocationLog>>>> {
    let logs = OAuthConnectionRepo::list_logs(
        &state.pool,
        member.organization_id(),
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: logs }))
}
