//! Repository for the `survey_analyses` table.

use sqlx::PgPool;
use offboardpro_core::types::DbId;

use crate::models::survey::{CreateSurveyAnalysis, SurveyAnalysis};

const COLUMNS: &str = "id, organization_id, survey_count, average_recommend_score, nps, \
                       statistics, summary, model, created_at";

pub struct SurveyAnalysisRepo;

impl SurveyAnalysisRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateSurveyAnalysis,
    ) -> Result<SurveyAnalysis, sqlx::Error> {
        let query = format!(
            "INSERT INTO survey_analyses
                (organization_id, survey_count, average_recommend_score, nps, statistics,
                 summary, model)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SurveyAnalysis>(&query)
            .bind(input.organization_id)
            .bind(input.survey_count)
            .bind(input.average_recommend_score)
            .bind(input.nps)
            .bind(&input.statistics)
            .bind(&input.summary)
            .bind(&input.model)
            .fetch_one(pool)
            .await
    }

    /// Most recent analysis of an organization.
    pub async fn latest(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Option<SurveyAnalysis>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM survey_analyses
             WHERE organization_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, SurveyAnalysis>(&query)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }
}
