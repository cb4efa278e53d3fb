//! Repository for the `organizations` table.

use sqlx::PgPool;
use offboardpro_core::entitlements::Plan;
use offboardpro_core::roles::ROLE_ADMIN;
use offboardpro_core::trial::SUBSCRIPTION_TRIALING;
use offboardpro_core::types::{DbId, Timestamp};

use crate::models::organization::Organization;
use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, subscription_plan, trial_ends_at, created_at, updated_at";

/// Result of attaching a new organization to a user.
#[derive(Debug)]
pub enum OrganizationSetup {
    Created {
        organization: Organization,
        user: User,
    },
    UserNotFound,
    /// The user already belongs to an organization; nothing was written.
    AlreadyMember,
}

/// Provides CRUD operations for organizations.
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Find an organization by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = $1");
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create an organization on the starter plan and make `user_id` its
    /// trialing admin, in one transaction.
    pub async fn create_for_user(
        pool: &PgPool,
        name: &str,
        user_id: DbId,
        trial_ends_at: Timestamp,
    ) -> Result<OrganizationSetup, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<Option<DbId>> =
            sqlx::query_scalar("SELECT organization_id FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        match current {
            None => return Ok(OrganizationSetup::UserNotFound),
            Some(Some(_)) => return Ok(OrganizationSetup::AlreadyMember),
            Some(None) => {}
        }

        let query = format!(
            "INSERT INTO organizations (name, subscription_plan, trial_ends_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let organization = sqlx::query_as::<_, Organization>(&query)
            .bind(name)
            .bind(Plan::Starter.as_str())
            .bind(trial_ends_at)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE users SET
                organization_id = $2,
                role = $3,
                subscription_status = $4,
                subscription_plan = $5,
                trial_ends_at = $6
             WHERE id = $1
             RETURNING {}",
            super::user_repo::COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(organization.id)
            .bind(ROLE_ADMIN)
            .bind(SUBSCRIPTION_TRIALING)
            .bind(Plan::Starter.as_str())
            .bind(trial_ends_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(OrganizationSetup::Created { organization, user })
    }

    /// Number of users attached to the organization.
    pub async fn count_users(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE organization_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
