//! Repository for the `tasks` table, including the completion cascade.

use sqlx::PgPool;
use offboardpro_core::offboarding::{
    should_cascade, OffboardingStatus, STATUS_COMPLETED, STATUS_IN_PROGRESS,
};
use offboardpro_core::types::DbId;

use crate::models::offboarding::{Offboarding, Task};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, offboarding_id, name, department, assignee_id, due_date, \
                        priority, order_index, completed, completed_at, completed_by, notes, \
                        version, created_at, updated_at";

/// Result of [`TaskRepo::complete`].
#[derive(Debug)]
pub enum TaskCompletion {
    Completed {
        task: Task,
        offboarding: Offboarding,
        /// `true` when this completion moved the offboarding to `completed`.
        offboarding_completed: bool,
    },
    /// The task was already completed; nothing was written.
    AlreadyCompleted { task: Task, offboarding: Offboarding },
    /// No such task in the organization.
    NotFound,
    /// The parent offboarding is cancelled.
    OffboardingCancelled,
    /// The caller's `expected_version` is stale.
    VersionMismatch { current: i32 },
}

/// Provides task reads and the completion transaction.
pub struct TaskRepo;

impl TaskRepo {
    /// Ordered tasks of an offboarding.
    pub async fn list_for_offboarding(
        pool: &PgPool,
        offboarding_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE offboarding_id = $1
             ORDER BY order_index, id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(offboarding_id)
            .fetch_all(pool)
            .await
    }

    /// Complete a task and cascade its offboarding when it was the last open one.
    ///
    /// The parent offboarding row is locked first, so concurrent completions
    /// for the same offboarding serialize and the cascade fires once.
    pub async fn complete(
        pool: &PgPool,
        task_id: DbId,
        organization_id: DbId,
        actor_id: DbId,
        notes: Option<&str>,
        expected_version: Option<i32>,
    ) -> Result<TaskCompletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {} FROM offboardings
             WHERE id = (SELECT offboarding_id FROM tasks WHERE id = $1)
               AND organization_id = $2
             FOR UPDATE",
            super::offboarding_repo::COLUMNS
        );
        let Some(offboarding) = sqlx::query_as::<_, Offboarding>(&query)
            .bind(task_id)
            .bind(organization_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(TaskCompletion::NotFound);
        };

        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .fetch_one(&mut *tx)
            .await?;

        let status = OffboardingStatus::parse(&offboarding.status);
        if status == Some(OffboardingStatus::Cancelled) {
            return Ok(TaskCompletion::OffboardingCancelled);
        }
        if task.completed {
            return Ok(TaskCompletion::AlreadyCompleted { task, offboarding });
        }
        if let Some(expected) = expected_version {
            if expected != task.version {
                return Ok(TaskCompletion::VersionMismatch {
                    current: task.version,
                });
            }
        }

        let query = format!(
            "UPDATE tasks
             SET completed = true, completed_at = NOW(), completed_by = $2, notes = $3,
                 version = version + 1
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .bind(actor_id)
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;

        let incomplete: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE offboarding_id = $1 AND completed = false",
        )
        .bind(offboarding.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut offboarding_completed = false;
        let offboarding = match status {
            Some(status) if should_cascade(status, incomplete) => {
                let query = format!(
                    "UPDATE offboardings
                     SET status = $2, completed_at = NOW(), version = version + 1
                     WHERE id = $1 AND status = $3
                     RETURNING {}",
                    super::offboarding_repo::COLUMNS
                );
                let updated = sqlx::query_as::<_, Offboarding>(&query)
                    .bind(offboarding.id)
                    .bind(STATUS_COMPLETED)
                    .bind(STATUS_IN_PROGRESS)
                    .fetch_optional(&mut *tx)
                    .await?;
                match updated {
                    Some(updated) => {
                        offboarding_completed = true;
                        updated
                    }
                    None => offboarding,
                }
            }
            _ => offboarding,
        };

        tx.commit().await?;
        Ok(TaskCompletion::Completed {
            task,
            offboarding,
            offboarding_completed,
        })
    }
}
