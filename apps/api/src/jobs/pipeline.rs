//! Recommendation Orchestrator — composes the normalizer, synthesizer, job
//! source, store, ranker, and response cache into the two public operations.
//!
//! Recommend flow: cache check → (hit: respond) | normalize → synthesize →
//!   fetch → (empty: respond empty) | ingest → read back this fetch's ids →
//!   rank → cache write → respond.
//! Search flow: query-log gate (page 1, 24h) → DB-cache read | fetch →
//!   ingest → touch query log (page 1) → respond.
//!
//! No stage retries. Upstream-source failures degrade to an empty success;
//! synthesis and persistence failures are fatal for the request.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::cache::{recommend_key, CachedRecommendation, ResponseCache};
use crate::jobs::prefs::{self, SearchPreferences};
use crate::jobs::ranker::{rank, RankedPosting};
use crate::jobs::source::{JobSource, SearchFilters};
use crate::jobs::store::{JobStore, FRESHNESS_WINDOW_HOURS};
use crate::jobs::synth;
use crate::llm_client::TextGenerator;
use crate::models::job::JobPostingRow;
use crate::resume::ResumeProvider;

/// Response for `GET /api/v1/jobs/recommend`.
#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub total: u64,
    pub jobs: Vec<RankedPosting>,
    pub page: u32,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for `GET /api/v1/jobs/search`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub data: Vec<JobPostingRow>,
    pub total: u64,
    pub page: u32,
    pub db_cached: bool,
}

/// Parameters for one search-mode request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub filters: SearchFilters,
}

/// The pipeline with its injected collaborators. Constructed once at startup;
/// every handler call goes through here.
pub struct JobPipeline {
    store: Arc<dyn JobStore>,
    cache: Arc<dyn ResponseCache>,
    resumes: Arc<dyn ResumeProvider>,
    textgen: Arc<dyn TextGenerator>,
    source: Arc<dyn JobSource>,
    default_country: String,
}

impl JobPipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        cache: Arc<dyn ResponseCache>,
        resumes: Arc<dyn ResumeProvider>,
        textgen: Arc<dyn TextGenerator>,
        source: Arc<dyn JobSource>,
        default_country: String,
    ) -> Self {
        Self {
            store,
            cache,
            resumes,
            textgen,
            source,
            default_country,
        }
    }

    /// Résumé-driven recommendations for `user_id`.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        page: u32,
        params: &[(String, String)],
    ) -> Result<RecommendResponse, AppError> {
        let key = recommend_key(user_id, page);
        if let Some(entry) = self.cache.get(&key).await {
            info!("Recommendation cache hit for user {user_id} page {page}");
            return Ok(RecommendResponse {
                query: entry.query,
                total: entry.total,
                jobs: entry.jobs,
                page,
                cached: true,
                message: None,
            });
        }

        let preferences =
            prefs::normalize(self.resumes.as_ref(), user_id, params, &self.default_country).await?;
        let query = synth::synthesize(self.textgen.as_ref(), &preferences).await?;

        let filters = filters_from_preferences(&preferences, params);
        let fetched = self.source.fetch(&query, page, &filters).await;

        if fetched.postings.is_empty() {
            info!("No jobs from upstream for user {user_id} (query: {query})");
            return Ok(RecommendResponse {
                query,
                total: 0,
                jobs: Vec::new(),
                page,
                cached: false,
                message: Some("No jobs found".to_string()),
            });
        }

        let mut external_ids = Vec::with_capacity(fetched.postings.len());
        for posting in &fetched.postings {
            let stored = self.store.upsert(posting).await?;
            external_ids.push(stored.external_id);
        }

        // Re-materialize exactly this fetch's rows so the upstream's
        // pagination contract is preserved.
        let rows = self.store.find_by_ids(&external_ids).await?;
        let ranked = rank(rows, &preferences.skills);
        let total = ranked.len() as u64;
        info!(
            "Ranked {total} postings for user {user_id} (query: {query}, page: {page})"
        );

        let entry = CachedRecommendation {
            query: query.clone(),
            jobs: ranked,
            total,
            cached_at: Utc::now(),
        };
        self.cache.put(&key, &entry).await;

        Ok(RecommendResponse {
            query,
            total,
            jobs: entry.jobs,
            page,
            cached: false,
            message: None,
        })
    }

    /// Query-driven search with the 24h query-level DB cache on page 1.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, AppError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AppError::Validation(
                "Search query is required".to_string(),
            ));
        }
        let page = request.page.max(1);
        let window_start = Utc::now() - Duration::hours(FRESHNESS_WINDOW_HOURS);

        // Only page 1 may be served from the store; later pages always go
        // upstream.
        if page == 1 && self.store.query_log_fresh(query, window_start).await? {
            let rows = self.store.find_recent_matching(query, window_start).await?;
            info!(
                "Search served from DB cache for \"{query}\" ({} rows)",
                rows.len()
            );
            return Ok(SearchResponse {
                total: rows.len() as u64,
                data: rows,
                page,
                db_cached: true,
            });
        }

        let fetched = self.source.fetch(query, page, &request.filters).await;

        let mut external_ids = Vec::with_capacity(fetched.postings.len());
        for posting in &fetched.postings {
            let stored = self.store.upsert(posting).await?;
            external_ids.push(stored.external_id);
        }

        if page == 1 {
            self.store.query_log_touch(query).await?;
        }

        let data = if external_ids.is_empty() {
            Vec::new()
        } else {
            self.store.find_by_ids(&external_ids).await?
        };

        Ok(SearchResponse {
            data,
            total: fetched.total,
            page,
            db_cached: false,
        })
    }

    /// Drops the user's cached recommendations. Invoked by résumé ingestion:
    /// a changed skill set invalidates prior rankings.
    pub async fn invalidate_recommendations(&self, user_id: Uuid) -> Result<(), AppError> {
        self.cache.invalidate_user(user_id).await
    }
}

/// Recommend-mode filters come from the normalized preferences; the few
/// knobs that have no preference equivalent pass through from raw params.
fn filters_from_preferences(
    preferences: &SearchPreferences,
    params: &[(String, String)],
) -> SearchFilters {
    SearchFilters {
        date_posted: prefs::first_param(params, "date_posted").map(str::to_string),
        country: Some(preferences.country.clone()),
        employment_types: preferences.employment_types.clone(),
        remote: Some(preferences.remote),
        radius: prefs::first_param(params, "radius").and_then(|r| r.parse().ok()),
        exclude_publishers: prefs::first_param(params, "exclude_job_publishers")
            .map(str::to_string),
    }
}
