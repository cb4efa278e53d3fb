//! Repository for the `exit_surveys` table.

use sqlx::{PgConnection, PgPool};
use offboardpro_core::types::DbId;

use crate::models::survey::{ExitSurvey, SurveyAnswers};

const COLUMNS: &str = "id, offboarding_id, organization_id, survey_token_id, departure_reason, \
                       likelihood_to_recommend, would_return, would_return_reason, suggestions, \
                       submitted_by, created_at";

pub struct ExitSurveyRepo;

impl ExitSurveyRepo {
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        offboarding_id: DbId,
        organization_id: DbId,
        survey_token_id: Option<DbId>,
        submitted_by: Option<DbId>,
        answers: &SurveyAnswers,
    ) -> Result<ExitSurvey, sqlx::Error> {
        let query = format!(
            "INSERT INTO exit_surveys
                (offboarding_id, organization_id, survey_token_id, departure_reason,
                 likelihood_to_recommend, would_return, would_return_reason, suggestions,
                 submitted_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ExitSurvey>(&query)
            .bind(offboarding_id)
            .bind(organization_id)
            .bind(survey_token_id)
            .bind(answers.departure_reason.trim())
            .bind(answers.likelihood_to_recommend)
            .bind(answers.would_return)
            .bind(&answers.would_return_reason)
            .bind(&answers.suggestions)
            .bind(submitted_by)
            .fetch_one(conn)
            .await
    }

    /// All surveys of an organization, newest first.
    pub async fn list_for_organization(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<ExitSurvey>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM exit_surveys
             WHERE organization_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ExitSurvey>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }
}
