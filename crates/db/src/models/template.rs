//! Checklist template models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use offboardpro_core::types::{DbId, Timestamp};

/// A row from the `templates` table. `organization_id = None` is a global default.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Template {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<DbId>,
    pub is_active: bool,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `template_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemplateTask {
    pub id: DbId,
    pub template_id: DbId,
    pub name: String,
    pub department: String,
    pub due_offset_days: i32,
    pub priority: String,
    pub order_index: i32,
}

/// A template together with its ordered tasks.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateWithTasks {
    #[serde(flatten)]
    pub template: Template,
    pub tasks: Vec<TemplateTask>,
}

/// DTO for creating an organization template.
#[derive(Debug, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub tasks: Vec<CreateTemplateTask>,
}

/// One task definition inside [`CreateTemplate`]. Order follows the list.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateTask {
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub due_offset_days: i32,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    offboardpro_core::offboarding::PRIORITY_MEDIUM.to_string()
}
