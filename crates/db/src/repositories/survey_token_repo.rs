//! Repository for the `survey_tokens` table.
//!
//! Issuance and consumption both run under a lock or a conditional update so
//! that one offboarding has at most one live token and each token admits
//! exactly one submission.

use sqlx::{PgConnection, PgPool};
use offboardpro_core::survey::{
    classify, expiry_from, generate_token, is_reusable, TokenState, TOKEN_STATUS_COMPLETED,
    TOKEN_STATUS_PENDING,
};
use offboardpro_core::types::{DbId, Timestamp};

use crate::models::survey::{
    ExitSurvey, IssueToken, OffboardingSnapshot, SurveyAnswers, SurveyToken,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, token, offboarding_id, organization_id, employee_email, employee_name, \
                       status, expires_at, completed_at, created_at";

/// A token returned by the issuance path.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: SurveyToken,
    /// `true` when a new row was inserted, `false` when a live token was reused.
    pub fresh: bool,
}

/// Result of [`SurveyTokenRepo::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted {
        survey: ExitSurvey,
        token: SurveyToken,
    },
    UnknownToken,
    /// The token exists but is not usable. Never `TokenState::Usable`.
    Rejected(TokenState),
}

/// Provides issuance, lookup and consumption of survey tokens.
pub struct SurveyTokenRepo;

impl SurveyTokenRepo {
    /// Return the live token for an offboarding or replace whatever exists
    /// with a new one. Runs under the offboarding row lock.
    ///
    /// Returns `None` when the offboarding does not belong to the organization.
    pub async fn create_or_reuse(
        pool: &PgPool,
        organization_id: DbId,
        input: &IssueToken,
        now: Timestamp,
    ) -> Result<Option<IssuedToken>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM offboardings WHERE id = $1 AND organization_id = $2 FOR UPDATE",
        )
        .bind(input.offboarding_id)
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let issued = Self::issue(&mut *tx, input, now).await?;
        tx.commit().await?;
        Ok(Some(issued))
    }

    /// Shared issuance step. The caller must hold the offboarding row lock.
    pub(crate) async fn issue(
        conn: &mut PgConnection,
        input: &IssueToken,
        now: Timestamp,
    ) -> Result<IssuedToken, sqlx::Error> {
        if let Some(existing) = Self::find_for_offboarding(conn, input.offboarding_id).await? {
            if is_reusable(&existing.status, existing.expires_at, now) {
                return Ok(IssuedToken {
                    token: existing,
                    fresh: false,
                });
            }
            sqlx::query("DELETE FROM survey_tokens WHERE offboarding_id = $1")
                .bind(input.offboarding_id)
                .execute(&mut *conn)
                .await?;
        }

        let query = format!(
            "INSERT INTO survey_tokens
                (token, offboarding_id, organization_id, employee_email, employee_name,
                 status, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let token = sqlx::query_as::<_, SurveyToken>(&query)
            .bind(generate_token())
            .bind(input.offboarding_id)
            .bind(input.organization_id)
            .bind(&input.employee_email)
            .bind(&input.employee_name)
            .bind(TOKEN_STATUS_PENDING)
            .bind(expiry_from(now, input.ttl_days))
            .fetch_one(&mut *conn)
            .await?;

        Ok(IssuedToken { token, fresh: true })
    }

    pub(crate) async fn find_for_offboarding(
        conn: &mut PgConnection,
        offboarding_id: DbId,
    ) -> Result<Option<SurveyToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM survey_tokens WHERE offboarding_id = $1");
        sqlx::query_as::<_, SurveyToken>(&query)
            .bind(offboarding_id)
            .fetch_optional(conn)
            .await
    }

    /// Find a token by its opaque value.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<SurveyToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM survey_tokens WHERE token = $1");
        sqlx::query_as::<_, SurveyToken>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Read-only view of the offboarding a token belongs to.
    pub async fn snapshot(
        pool: &PgPool,
        offboarding_id: DbId,
    ) -> Result<Option<OffboardingSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, OffboardingSnapshot>(
            "SELECT employee_name, department, role_title, last_working_day
             FROM offboardings WHERE id = $1",
        )
        .bind(offboarding_id)
        .fetch_optional(pool)
        .await
    }

    /// Consume a token and store the survey in one transaction.
    ///
    /// The token transition is conditional on `pending` and unexpired, so of
    /// two concurrent submissions exactly one succeeds.
    pub async fn submit(
        pool: &PgPool,
        token: &str,
        answers: &SurveyAnswers,
        now: Timestamp,
    ) -> Result<SubmitOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE survey_tokens SET status = $2, completed_at = $4
             WHERE token = $1 AND status = $3 AND expires_at > $4
             RETURNING {COLUMNS}"
        );
        let consumed = sqlx::query_as::<_, SurveyToken>(&query)
            .bind(token)
            .bind(TOKEN_STATUS_COMPLETED)
            .bind(TOKEN_STATUS_PENDING)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(consumed) = consumed else {
            drop(tx);
            return match Self::find_by_token(pool, token).await? {
                None => Ok(SubmitOutcome::UnknownToken),
                Some(existing) => Ok(SubmitOutcome::Rejected(
                    match classify(&existing.status, existing.expires_at, now) {
                        // expires_at == now fails the update but is not yet past.
                        TokenState::Usable => TokenState::Expired,
                        state => state,
                    },
                )),
            };
        };

        let survey = super::exit_survey_repo::ExitSurveyRepo::insert(
            &mut *tx,
            consumed.offboarding_id,
            consumed.organization_id,
            Some(consumed.id),
            None,
            answers,
        )
        .await?;

        tx.commit().await?;
        Ok(SubmitOutcome::Submitted {
            survey,
            token: consumed,
        })
    }
}
