//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`OrgMember`] and rejects callers whose role is not in
//! the allowed set with 403 Forbidden.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use offboardpro_core::error::CoreError;
use offboardpro_core::roles::{SECURITY_ROLES, TEMPLATE_AUTHOR_ROLES};

use super::org::OrgMember;
use crate::error::AppError;
use crate::state::AppState;

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[&str],
    message: &str,
) -> Result<OrgMember, AppError> {
    let member = OrgMember::from_request_parts(parts, state).await?;
    if !allowed.contains(&member.role()) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(member)
}

/// Requires `admin` or `hr_manager`.
///
/// ```ignore
/// async fn create(RequireTemplateAuthor(member): RequireTemplateAuthor) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireTemplateAuthor(pub OrgMember);

impl FromRequestParts<AppState> for RequireTemplateAuthor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(
            parts,
            state,
            TEMPLATE_AUTHOR_ROLES,
            "Admin or HR manager role required",
        )
        .await
        .map(RequireTemplateAuthor)
    }
}

/// Requires `admin` or `it_manager`.
pub struct RequireSecurityRole(pub OrgMember);

impl FromRequestParts<AppState> for RequireSecurityRole {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, SECURITY_ROLES, "Admin or IT manager role required")
            .await
            .map(RequireSecurityRole)
    }
}
