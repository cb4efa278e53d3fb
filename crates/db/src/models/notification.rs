//! Notification entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use offboardpro_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub related_task_id: Option<DbId>,
    pub related_offboarding_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for inserting a notification.
#[derive(Debug)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub message: String,
    pub notification_type: String,
    pub related_task_id: Option<DbId>,
    pub related_offboarding_id: Option<DbId>,
}
