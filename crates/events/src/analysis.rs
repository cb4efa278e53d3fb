//! Exit-survey corpus analysis.
//!
//! [`SurveyAnalyzer`] aggregates an organization's surveys into
//! [`SurveyStats`], asks an OpenAI-compatible chat-completions endpoint for a
//! written summary, and stores the result as a `survey_analyses` row. When
//! no API key is configured the statistics summary is stored instead.

use std::time::Duration;

use serde::Deserialize;
use offboardpro_core::survey::{SurveyAnswer, SurveyStats};
use offboardpro_core::types::DbId;
use offboardpro_db::models::survey::{CreateSurveyAnalysis, ExitSurvey, SurveyAnalysis};
use offboardpro_db::repositories::{ExitSurveyRepo, SurveyAnalysisRepo};
use offboardpro_db::DbPool;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// HTTP request timeout for one completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Most free-text suggestions included in the prompt.
const MAX_SUGGESTIONS: usize = 50;

const SYSTEM_PROMPT: &str = "You analyze employee exit surveys for an HR team. \
    Summarize the main departure themes and recommend at most three concrete \
    retention actions. Answer in under 200 words of plain text.";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM returned HTTP {0}")]
    HttpStatus(u16),

    #[error("LLM returned no completion")]
    EmptyCompletion,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode statistics: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

impl AnalysisConfig {
    /// Load from `AI_API_KEY`, `AI_API_URL` and `AI_MODEL`.
    ///
    /// Returns `None` if `AI_API_KEY` is not set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("AI_API_KEY").ok().filter(|k| !k.is_empty())?;
        Some(Self {
            api_key,
            api_url: std::env::var("AI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// SurveyAnalyzer
// ---------------------------------------------------------------------------

pub struct SurveyAnalyzer {
    client: reqwest::Client,
    config: Option<AnalysisConfig>,
}

impl SurveyAnalyzer {
    pub fn new(config: Option<AnalysisConfig>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Analyze the organization's full survey corpus and store the result.
    pub async fn analyze(
        &self,
        pool: &DbPool,
        organization_id: DbId,
    ) -> Result<SurveyAnalysis, AnalysisError> {
        let surveys = ExitSurveyRepo::list_for_organization(pool, organization_id).await?;
        let answers: Vec<SurveyAnswer<'_>> = surveys
            .iter()
            .map(|s| SurveyAnswer {
                departure_reason: &s.departure_reason,
                likelihood_to_recommend: s.likelihood_to_recommend,
                would_return: s.would_return,
            })
            .collect();
        let stats = SurveyStats::compute(&answers);

        let (summary, model) = match &self.config {
            Some(config) if stats.count > 0 => {
                let prompt = build_prompt(&stats, &surveys);
                (self.complete(config, &prompt).await?, Some(config.model.clone()))
            }
            _ => (stats.describe(), None),
        };

        let analysis = SurveyAnalysisRepo::create(
            pool,
            &CreateSurveyAnalysis {
                organization_id,
                survey_count: i32::try_from(stats.count).unwrap_or(i32::MAX),
                average_recommend_score: stats.average_recommend_score,
                nps: stats.nps,
                statistics: serde_json::to_value(&stats)?,
                summary,
                model,
            },
        )
        .await?;

        tracing::info!(
            organization_id,
            survey_count = stats.count,
            analysis_id = analysis.id,
            "Survey analysis stored"
        );
        Ok(analysis)
    }

    async fn complete(&self, config: &AnalysisConfig, prompt: &str) -> Result<String, AnalysisError> {
        let body = serde_json::json!({
            "model": config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AnalysisError::HttpStatus(response.status().as_u16()));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AnalysisError::EmptyCompletion)
    }
}

/// User prompt: the statistics line followed by free-text suggestions.
fn build_prompt(stats: &SurveyStats, surveys: &[ExitSurvey]) -> String {
    let mut prompt = stats.describe();
    let suggestions: Vec<&str> = surveys
        .iter()
        .filter_map(|s| s.suggestions.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect();
    if !suggestions.is_empty() {
        prompt.push_str("\n\nSuggestions from departing employees:");
        for s in suggestions {
            prompt.push_str("\n- ");
            prompt.push_str(s);
        }
    }
    prompt
}
