use axum::{
    extract::{Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::pipeline::{RecommendResponse, SearchRequest, SearchResponse};
use crate::jobs::prefs::{first_param, split_employment_types};
use crate::jobs::source::SearchFilters;
use crate::state::AppState;

/// GET /api/v1/jobs/recommend
///
/// Query parameters are taken as raw pairs so repeated parameters coerce to
/// their first occurrence instead of failing deserialization.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<RecommendResponse>, AppError> {
    let user_id = first_param(&params, "user_id")
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| AppError::Validation("user_id must be a valid UUID".to_string()))?;
    let page = page_param(&params);

    let response = state.pipeline.recommend(user_id, page, &params).await?;
    Ok(Json(response))
}

/// GET /api/v1/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = first_param(&params, "query")
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?
        .to_string();

    let filters = SearchFilters {
        date_posted: first_param(&params, "date_posted").map(str::to_string),
        country: first_param(&params, "country").map(str::to_string),
        employment_types: first_param(&params, "employment_types")
            .and_then(split_employment_types),
        remote: first_param(&params, "work_from_home").map(|v| v == "true"),
        radius: first_param(&params, "radius").and_then(|r| r.parse().ok()),
        exclude_publishers: first_param(&params, "exclude_job_publishers").map(str::to_string),
    };

    let response = state
        .pipeline
        .search(SearchRequest {
            query,
            page: page_param(&params),
            filters,
        })
        .await?;
    Ok(Json(response))
}

fn page_param(params: &[(String, String)]) -> u32 {
    first_param(params, "page")
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}
