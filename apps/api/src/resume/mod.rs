//! Résumé Provider — the read contract the recommendation pipeline consumes,
//! plus the thin ingestion endpoint. Extraction (PDF text, AI field parsing)
//! happens upstream of this service; the rows stored here are its output.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::state::AppState;

/// The pipeline's view of a résumé: extracted skills and how many experience
/// entries the extraction found.
#[derive(Debug, Clone)]
pub struct ResumeProfile {
    pub skills: Vec<String>,
    pub experience_count: u32,
}

#[async_trait]
pub trait ResumeProvider: Send + Sync {
    /// The most recently created résumé for `user_id`, or `None` when the
    /// user has never uploaded one.
    async fn latest_for(&self, user_id: Uuid) -> Result<Option<ResumeProfile>, AppError>;
}

pub struct PgResumeProvider {
    pool: PgPool,
}

impl PgResumeProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeProvider for PgResumeProvider {
    async fn latest_for(&self, user_id: Uuid) -> Result<Option<ResumeProfile>, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| profile_from_data(&r.data)))
    }
}

/// Reduces the extracted résumé JSON to the pipeline's view of it. A missing
/// or non-list `skills` field yields an empty list, which the normalizer
/// rejects with a client error.
pub fn profile_from_data(data: &Value) -> ResumeProfile {
    let skills = data
        .get("skills")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    let experience_count = data
        .get("experience")
        .and_then(|v| v.as_array())
        .map(|arr| arr.len() as u32)
        .unwrap_or(0);
    ResumeProfile {
        skills,
        experience_count,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    /// Already-extracted résumé fields (`skills`, `experience`, …).
    pub data: Value,
}

/// POST /api/v1/resumes
///
/// A changed skill set invalidates prior rankings, so the caller's cached
/// recommendations are dropped in the same request.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let row: ResumeRow =
        sqlx::query_as("INSERT INTO resumes (id, user_id, data) VALUES ($1, $2, $3) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(req.user_id)
            .bind(&req.data)
            .fetch_one(&state.db)
            .await?;

    state.pipeline.invalidate_recommendations(req.user_id).await?;
    info!("Stored resume {} for user {}", row.id, row.user_id);

    Ok((StatusCode::CREATED, Json(row)))
}
