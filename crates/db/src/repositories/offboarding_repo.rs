//! Repository for the `offboardings` table.

use sqlx::PgPool;
use offboardpro_core::offboarding::{
    progress_percent, OffboardingStatus, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_IN_PROGRESS,
};
use offboardpro_core::survey::TOKEN_STATUS_COMPLETED;
use offboardpro_core::types::{DbId, Timestamp};

use crate::models::offboarding::{
    CreateOffboarding, NewTask, Offboarding, OffboardingSummary, Task,
};
use crate::models::survey::{IssueToken, SurveyToken};
use crate::repositories::survey_token_repo::SurveyTokenRepo;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, organization_id, employee_name, employee_email, department, \
                        role_title, last_working_day, template_id, status, version, created_by, \
                        completed_at, created_at, updated_at";

/// Result of [`OffboardingRepo::finalize`].
#[derive(Debug)]
pub enum FinalizeOutcome {
    Finalized {
        offboarding: Offboarding,
        token: SurveyToken,
        /// `false` when the offboarding was already completed before this call.
        newly_completed: bool,
        /// `false` when an existing token was reused.
        token_issued: bool,
    },
    NotFound,
    Cancelled,
}

impl FinalizeOutcome {
    /// Whether this call produced something the employee has not been invited to yet.
    pub fn needs_invitation(&self) -> bool {
        matches!(
            self,
            FinalizeOutcome::Finalized { newly_completed, token_issued, token, .. }
                if (*newly_completed || *token_issued) && token.status != TOKEN_STATUS_COMPLETED
        )
    }
}

/// Provides CRUD operations for offboardings.
pub struct OffboardingRepo;

impl OffboardingRepo {
    /// Insert an offboarding and its materialized tasks in one transaction.
    pub async fn create_with_tasks(
        pool: &PgPool,
        organization_id: DbId,
        created_by: DbId,
        input: &CreateOffboarding,
        tasks: &[NewTask],
    ) -> Result<(Offboarding, Vec<Task>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO offboardings
                (organization_id, employee_name, employee_email, department, role_title,
                 last_working_day, template_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let offboarding = sqlx::query_as::<_, Offboarding>(&query)
            .bind(organization_id)
            .bind(&input.employee_name)
            .bind(&input.employee_email)
            .bind(&input.department)
            .bind(&input.role_title)
            .bind(input.last_working_day)
            .bind(input.template_id)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO tasks (offboarding_id, name, department, due_date, priority, order_index)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            super::task_repo::COLUMNS
        );
        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            let row = sqlx::query_as::<_, Task>(&query)
                .bind(offboarding.id)
                .bind(&task.name)
                .bind(&task.department)
                .bind(task.due_date)
                .bind(&task.priority)
                .bind(task.order_index)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok((offboarding, created))
    }

    /// Find an offboarding within an organization.
    pub async fn find(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
    ) -> Result<Option<Offboarding>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM offboardings WHERE id = $1 AND organization_id = $2"
        );
        sqlx::query_as::<_, Offboarding>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// List an organization's offboardings with task progress, newest first.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<OffboardingSummary>, sqlx::Error> {
        let columns = COLUMNS
            .split(',')
            .map(|c| format!("o.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {columns},
                    COUNT(t.id) AS total_tasks,
                    COUNT(t.id) FILTER (WHERE t.completed) AS completed_tasks
             FROM offboardings o
             LEFT JOIN tasks t ON t.offboarding_id = o.id
             WHERE o.organization_id = $1
               AND ($2::TEXT IS NULL OR o.status = $2)
             GROUP BY o.id
             ORDER BY o.created_at DESC, o.id DESC"
        );
        let mut summaries = sqlx::query_as::<_, OffboardingSummary>(&query)
            .bind(organization_id)
            .bind(status)
            .fetch_all(pool)
            .await?;
        for summary in &mut summaries {
            summary.progress_percent =
                progress_percent(summary.completed_tasks, summary.total_tasks);
        }
        Ok(summaries)
    }

    /// Number of offboardings the organization created at or after `since`.
    pub async fn count_created_since(
        pool: &PgPool,
        organization_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM offboardings WHERE organization_id = $1 AND created_at >= $2",
        )
        .bind(organization_id)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Cancel an in-progress offboarding.
    ///
    /// Returns `None` when no in-progress row matched (missing or terminal).
    pub async fn cancel(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
    ) -> Result<Option<Offboarding>, sqlx::Error> {
        let query = format!(
            "UPDATE offboardings SET status = $3, version = version + 1
             WHERE id = $1 AND organization_id = $2 AND status = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offboarding>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(STATUS_CANCELLED)
            .bind(STATUS_IN_PROGRESS)
            .fetch_optional(pool)
            .await
    }

    /// Complete an offboarding and issue (or reuse) its survey token in one
    /// transaction holding the offboarding row lock.
    ///
    /// A token that was already consumed is returned as-is and never replaced.
    pub async fn finalize(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
        ttl_days: i64,
        now: Timestamp,
    ) -> Result<FinalizeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM offboardings
             WHERE id = $1 AND organization_id = $2
             FOR UPDATE"
        );
        let Some(current) = sqlx::query_as::<_, Offboarding>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(FinalizeOutcome::NotFound);
        };

        let status = OffboardingStatus::parse(&current.status);
        if status == Some(OffboardingStatus::Cancelled) {
            return Ok(FinalizeOutcome::Cancelled);
        }

        let newly_completed =
            status.is_some_and(|s| s.can_transition_to(OffboardingStatus::Completed));
        let offboarding = if newly_completed {
            let query = format!(
                "UPDATE offboardings
                 SET status = $2, completed_at = NOW(), version = version + 1
                 WHERE id = $1
                 RETURNING {COLUMNS}"
            );
            sqlx::query_as::<_, Offboarding>(&query)
                .bind(id)
                .bind(STATUS_COMPLETED)
                .fetch_one(&mut *tx)
                .await?
        } else {
            current
        };

        let existing = SurveyTokenRepo::find_for_offboarding(&mut *tx, offboarding.id).await?;
        let (token, token_issued) = match existing {
            Some(token) if token.status == TOKEN_STATUS_COMPLETED => (token, false),
            _ => {
                let issued = SurveyTokenRepo::issue(
                    &mut *tx,
                    &IssueToken {
                        offboarding_id: offboarding.id,
                        organization_id: offboarding.organization_id,
                        employee_email: offboarding.employee_email.clone(),
                        employee_name: offboarding.employee_name.clone(),
                        ttl_days,
                    },
                    now,
                )
                .await?;
                (issued.token, issued.fresh)
            }
        };

        tx.commit().await?;
        Ok(FinalizeOutcome::Finalized {
            offboarding,
            token,
            newly_completed,
            token_issued,
        })
    }
}
