//! Repository for the `templates` and `template_tasks` tables.
//!
//! A template with `organization_id IS NULL` is a global default and is
//! visible to every organization.

use sqlx::PgPool;
use offboardpro_core::types::DbId;

use crate::models::template::{CreateTemplate, Template, TemplateTask, TemplateWithTasks};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, description, organization_id, is_active, created_by, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, template_id, name, department, due_offset_days, priority, order_index";

/// Provides CRUD operations for checklist templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Active templates visible to an organization: global ones first, then
    /// the organization's own, each group by name.
    pub async fn list_visible(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<Template>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM templates
             WHERE is_active = true
               AND (organization_id IS NULL OR organization_id = $1)
             ORDER BY organization_id NULLS FIRST, name"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Like [`Self::list_visible`] with each template's ordered tasks attached.
    pub async fn list_visible_with_tasks(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<TemplateWithTasks>, sqlx::Error> {
        let templates = Self::list_visible(pool, organization_id).await?;
        let ids: Vec<DbId> = templates.iter().map(|t| t.id).collect();

        let query = format!(
            "SELECT {TASK_COLUMNS} FROM template_tasks
             WHERE template_id = ANY($1)
             ORDER BY template_id, order_index, id"
        );
        let mut tasks = sqlx::query_as::<_, TemplateTask>(&query)
            .bind(&ids)
            .fetch_all(pool)
            .await?;

        Ok(templates
            .into_iter()
            .map(|template| {
                let (own, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut tasks)
                    .into_iter()
                    .partition(|t| t.template_id == template.id);
                tasks = rest;
                TemplateWithTasks {
                    template,
                    tasks: own,
                }
            })
            .collect())
    }

    /// Find a template visible to the organization, with its tasks.
    pub async fn find_visible(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
    ) -> Result<Option<TemplateWithTasks>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM templates
             WHERE id = $1 AND (organization_id IS NULL OR organization_id = $2)"
        );
        let template = sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await?;

        match template {
            Some(template) => {
                let tasks = Self::list_tasks(pool, template.id).await?;
                Ok(Some(TemplateWithTasks { template, tasks }))
            }
            None => Ok(None),
        }
    }

    /// Ordered tasks of a template.
    pub async fn list_tasks(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<TemplateTask>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM template_tasks
             WHERE template_id = $1
             ORDER BY order_index, id"
        );
        sqlx::query_as::<_, TemplateTask>(&query)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    /// Number of templates owned by the organization (globals excluded).
    pub async fn count_for_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM templates WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(pool)
            .await
    }

    /// Insert an organization template and its tasks in one transaction.
    ///
    /// Task `order_index` follows the order of `input.tasks`.
    pub async fn create_with_tasks(
        pool: &PgPool,
        organization_id: DbId,
        created_by: DbId,
        input: &CreateTemplate,
    ) -> Result<TemplateWithTasks, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO templates (name, description, organization_id, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, Template>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(organization_id)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO template_tasks
                (template_id, name, department, due_offset_days, priority, order_index)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TASK_COLUMNS}"
        );
        let mut tasks = Vec::with_capacity(input.tasks.len());
        for (index, task) in input.tasks.iter().enumerate() {
            let row = sqlx::query_as::<_, TemplateTask>(&query)
                .bind(template.id)
                .bind(&task.name)
                .bind(&task.department)
                .bind(task.due_offset_days)
                .bind(&task.priority)
                .bind(index as i32)
                .fetch_one(&mut *tx)
                .await?;
            tasks.push(row);
        }

        tx.commit().await?;
        Ok(TemplateWithTasks { template, tasks })
    }
}
