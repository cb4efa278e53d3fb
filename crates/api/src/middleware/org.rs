//! Organization membership extractor.
//!
//! Tenant-scoped handlers take an [`OrgMember`] instead of a bare
//! [`AuthUser`]. The user row is re-read on every request so deactivation,
//! role changes and organization moves apply without waiting for the access
//! token to expire.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use offboardpro_core::entitlements::{Plan, PlanLimits};
use offboardpro_core::error::CoreError;
use offboardpro_core::types::DbId;
use offboardpro_db::models::organization::Organization;
use offboardpro_db::models::user::User;
use offboardpro_db::repositories::{OrganizationRepo, UserRepo};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An active user together with the organization they belong to.
#[derive(Debug, Clone)]
pub struct OrgMember {
    pub user: User,
    pub organization: Organization,
}

impl OrgMember {
    pub fn user_id(&self) -> DbId {
        self.user.id
    }

    pub fn organization_id(&self) -> DbId {
        self.organization.id
    }

    pub fn role(&self) -> &str {
        &self.user.role
    }

    pub fn plan(&self) -> Plan {
        Plan::from_name(Some(&self.organization.subscription_plan))
    }

    pub fn limits(&self) -> PlanLimits {
        self.plan().limits()
    }
}

impl FromRequestParts<AppState> for OrgMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let user = UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "User no longer exists or is deactivated".into(),
                ))
            })?;

        let organization_id = user.organization_id.ok_or_else(|| {
            AppError::BadRequest("User does not belong to an organization".into())
        })?;

        let organization = OrganizationRepo::find_by_id(&state.pool, organization_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("User does not belong to an organization".into())
            })?;

        Ok(OrgMember { user, organization })
    }
}
