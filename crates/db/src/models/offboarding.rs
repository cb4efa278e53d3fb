//! Offboarding and task models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use offboardpro_core::types::{Date, DbId, Timestamp};

/// A row from the `offboardings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Offboarding {
    pub id: DbId,
    pub organization_id: DbId,
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub role_title: Option<String>,
    pub last_working_day: Date,
    pub template_id: Option<DbId>,
    pub status: String,
    pub version: i32,
    pub created_by: Option<DbId>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Offboarding row plus task progress, used by list endpoints.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OffboardingSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub offboarding: Offboarding,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    #[sqlx(skip)]
    pub progress_percent: i64,
}

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub offboarding_id: DbId,
    pub name: String,
    pub department: Option<String>,
    pub assignee_id: Option<DbId>,
    pub due_date: Option<Date>,
    pub priority: String,
    pub order_index: i32,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub completed_by: Option<DbId>,
    pub notes: Option<String>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An offboarding together with its ordered tasks.
#[derive(Debug, Clone, Serialize)]
pub struct OffboardingDetail {
    #[serde(flatten)]
    pub offboarding: Offboarding,
    pub tasks: Vec<Task>,
}

/// DTO for creating an offboarding from a template.
#[derive(Debug, Deserialize)]
pub struct CreateOffboarding {
    pub employee_name: String,
    pub employee_email: String,
    pub department: Option<String>,
    pub role_title: Option<String>,
    pub last_working_day: Date,
    pub template_id: Option<DbId>,
}

/// A task to materialize, already resolved from a template task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub department: Option<String>,
    pub due_date: Option<Date>,
    pub priority: String,
    pub order_index: i32,
}
