//! Handlers for the `/tasks` resource.

use axum::extract::{Path, State};
use axum::Json;
use offboardpro_core::error::CoreError;
use offboardpro_core::offboarding::completion_notification;
use offboardpro_core::types::DbId;
use offboardpro_db::models::notification::CreateNotification;
use offboardpro_db::models::offboarding::{Offboarding, Task};
use offboardpro_db::repositories::{NotificationRepo, TaskCompletion, TaskRepo};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::org::OrgMember;
use crate::state::AppState;

/// Request body for `POST /tasks/{id}/complete`. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct CompleteTaskRequest {
    pub notes: Option<String>,
    /// Optimistic concurrency guard; omitted means last write wins.
    pub expected_version: Option<i32>,
}

/// POST /api/tasks/{id}/complete
///
/// Complete a task. When it was the last open task of an in-progress
/// offboarding, the offboarding completes in the same transaction.
pub async fn complete(
    member: OrgMember,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<CompleteTaskRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let notes = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let outcome = TaskRepo::complete(
        &state.pool,
        task_id,
        member.organization_id(),
        member.user_id(),
        notes,
        input.expected_version,
    )
    .await?;

    match outcome {
        TaskCompletion::Completed {
            task,
            offboarding,
            offboarding_completed,
        } => {
            tracing::info!(
                task_id,
                offboarding_id = offboarding.id,
                user_id = member.user_id(),
                offboarding_completed,
                "Task completed"
            );
            notify_creator(&state, &task, &offboarding, offboarding_completed).await;
            Ok(Json(json!({
                "success": true,
                "task": task,
                "offboarding_completed": offboarding_completed,
            })))
        }
        TaskCompletion::AlreadyCompleted { task, .. } => Ok(Json(json!({
            "success": true,
            "task": task,
            "offboarding_completed": false,
        }))),
        TaskCompletion::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Task",
            id: task_id,
        })),
        TaskCompletion::OffboardingCancelled => Err(AppError::Core(CoreError::InvalidState(
            "Cannot complete a task of a cancelled offboarding".into(),
        ))),
        TaskCompletion::VersionMismatch { current } => Err(AppError::Core(CoreError::Conflict(
            format!("Task was modified concurrently (current version {current})"),
        ))),
    }
}

/// Tell the offboarding's creator about the completion. Best effort.
async fn notify_creator(state: &AppState, task: &Task, offboarding: &Offboarding, cascaded: bool) {
    let Some(creator) = offboarding.created_by else {
        return;
    };
    let (notification_type, message) =
        completion_notification(&task.name, &offboarding.employee_name, cascaded);

    let input = CreateNotification {
        user_id: creator,
        message,
        notification_type: notification_type.to_string(),
        related_task_id: Some(task.id),
        related_offboarding_id: Some(offboarding.id),
    };
    if let Err(e) = NotificationRepo::create(&state.pool, &input).await {
        tracing::warn!(task_id = task.id, error = %e, "Failed to create completion notification");
    }
}
