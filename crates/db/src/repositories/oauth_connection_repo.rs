//! Repository for the `oauth_connections` and `revocation_logs` tables.
//!
//! Every revocation writes its audit rows in the same transaction as the
//! status change, derived from the rows the update actually touched.

use sqlx::{PgConnection, PgPool};
use offboardpro_core::revocation::{
    CONNECTION_STATUS_ACTIVE, CONNECTION_STATUS_REVOKED, METHOD_BULK, METHOD_MANUAL,
};
use offboardpro_core::types::DbId;

use crate::models::oauth_connection::{CreateOAuthConnection, OAuthConnection, RevocationLog};

const COLUMNS: &str = "id, organization_id, offboarding_id, app_name, employee_email, scopes, \
                       status, revoked_at, revoked_by, revocation_method, version, created_at";

const LOG_COLUMNS: &str = "id, connection_id, organization_id, app_name, employee_email, \
                           status_before, status_after, revoked_by, revocation_method, created_at";

/// Result of [`OAuthConnectionRepo::revoke_one`].
#[derive(Debug)]
pub enum RevokeOutcome {
    Revoked(OAuthConnection),
    AlreadyRevoked,
    NotFound,
}

pub struct OAuthConnectionRepo;

impl OAuthConnectionRepo {
    /// Register a connection in the active state.
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateOAuthConnection,
    ) -> Result<OAuthConnection, sqlx::Error> {
        let query = format!(
            "INSERT INTO oauth_connections
                (organization_id, offboarding_id, app_name, employee_email, scopes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OAuthConnection>(&query)
            .bind(organization_id)
            .bind(input.offboarding_id)
            .bind(&input.app_name)
            .bind(&input.employee_email)
            .bind(&input.scopes)
            .fetch_one(pool)
            .await
    }

    /// List an organization's connections, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<OAuthConnection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM oauth_connections
             WHERE organization_id = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, OAuthConnection>(&query)
            .bind(organization_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Revoke every active connection of the organization.
    ///
    /// Returns the revoked rows; an empty result means nothing was written.
    pub async fn revoke_all(
        pool: &PgPool,
        organization_id: DbId,
        actor_id: DbId,
    ) -> Result<Vec<OAuthConnection>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE oauth_connections
             SET status = $3, revoked_at = NOW(), revoked_by = $2,
                 revocation_method = $4, version = version + 1
             WHERE organization_id = $1 AND status = $5
             RETURNING {COLUMNS}"
        );
        let revoked = sqlx::query_as::<_, OAuthConnection>(&query)
            .bind(organization_id)
            .bind(actor_id)
            .bind(CONNECTION_STATUS_REVOKED)
            .bind(METHOD_BULK)
            .bind(CONNECTION_STATUS_ACTIVE)
            .fetch_all(&mut *tx)
            .await?;

        if !revoked.is_empty() {
            let ids: Vec<DbId> = revoked.iter().map(|c| c.id).collect();
            Self::write_logs(&mut *tx, &ids).await?;
        }

        tx.commit().await?;
        Ok(revoked)
    }

    /// Revoke one active connection with method `manual`.
    pub async fn revoke_one(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
        actor_id: DbId,
    ) -> Result<RevokeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE oauth_connections
             SET status = $4, revoked_at = NOW(), revoked_by = $3,
                 revocation_method = $5, version = version + 1
             WHERE id = $1 AND organization_id = $2 AND status = $6
             RETURNING {COLUMNS}"
        );
        let revoked = sqlx::query_as::<_, OAuthConnection>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(actor_id)
            .bind(CONNECTION_STATUS_REVOKED)
            .bind(METHOD_MANUAL)
            .bind(CONNECTION_STATUS_ACTIVE)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(connection) = revoked else {
            let exists: Option<DbId> = sqlx::query_scalar(
                "SELECT id FROM oauth_connections WHERE id = $1 AND organization_id = $2",
            )
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&mut *tx)
            .await?;
            return Ok(match exists {
                Some(_) => RevokeOutcome::AlreadyRevoked,
                None => RevokeOutcome::NotFound,
            });
        };

        Self::write_logs(&mut *tx, &[connection.id]).await?;
        tx.commit().await?;
        Ok(RevokeOutcome::Revoked(connection))
    }

    /// Append one log per connection from its current (revoked) row.
    async fn write_logs(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO revocation_logs
                (connection_id, organization_id, app_name, employee_email,
                 status_before, status_after, revoked_by, revocation_method)
             SELECT id, organization_id, app_name, employee_email,
                    $2, status, revoked_by, revocation_method
             FROM oauth_connections
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(CONNECTION_STATUS_ACTIVE)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Audit trail of an organization, newest first.
    pub async fn list_logs(
        pool: &PgPool,
        organization_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RevocationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM revocation_logs
             WHERE organization_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RevocationLog>(&query)
            .bind(organization_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
