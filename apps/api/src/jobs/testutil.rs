//! In-memory doubles for the pipeline's trait seams, plus posting fixtures.
//!
//! `InMemoryStore` mirrors the SQL semantics of `PgJobStore` (idempotent
//! first-write-wins upsert, expiry filtering, newest-posted-first ordering)
//! so orchestrator tests exercise the same contract the real store provides.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::cache::{CachedRecommendation, ResponseCache};
use crate::jobs::source::{JobSearchPage, JobSource, SearchFilters, UpstreamPosting};
use crate::jobs::store::JobStore;
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::job::JobPostingRow;
use crate::resume::{ResumeProfile, ResumeProvider};

pub fn sample_posting(external_id: &str, title: &str, description: &str) -> UpstreamPosting {
    UpstreamPosting {
        job_id: external_id.to_string(),
        job_title: Some(title.to_string()),
        employer_name: Some("Example Inc".to_string()),
        employer_logo: None,
        employer_website: None,
        job_publisher: Some("LinkedIn".to_string()),
        job_employment_type: Some("FULLTIME".to_string()),
        job_employment_types: Some(vec!["FULLTIME".to_string()]),
        job_apply_link: Some("https://example.com/apply".to_string()),
        job_description: Some(description.to_string()),
        job_is_remote: Some(false),
        job_posted_at: Some("2 days ago".to_string()),
        job_posted_at_timestamp: Some(1_754_300_000),
        job_posted_at_datetime_utc: None,
        job_location: Some("Pune, MH, India".to_string()),
        job_city: Some("Pune".to_string()),
        job_state: Some("MH".to_string()),
        job_country: Some("IN".to_string()),
        job_latitude: None,
        job_longitude: None,
        job_min_salary: None,
        job_max_salary: None,
        job_salary_period: None,
        job_highlights: Some(serde_json::json!({"Qualifications": []})),
        job_onet_soc: None,
        job_onet_job_zone: None,
    }
}

pub fn sample_row(external_id: &str, title: &str, description: &str) -> JobPostingRow {
    JobPostingRow::from_upstream(&sample_posting(external_id, title, description), Utc::now())
}

fn newest_posted_first(rows: &mut [JobPostingRow]) {
    rows.sort_by(|a, b| match (a.posted_at_timestamp, b.posted_at_timestamp) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Store double
// ────────────────────────────────────────────────────────────────────────────

pub struct InMemoryStore {
    rows: Mutex<Vec<JobPostingRow>>,
    query_log: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            query_log: Mutex::new(HashMap::new()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Inserts a pre-built row directly, bypassing upsert — for backdating
    /// `expires_at` in freshness tests.
    pub fn insert_row(&self, row: JobPostingRow) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn touch_query_now(&self, query: &str) {
        self.touch_query_at(query, Utc::now());
    }

    pub fn touch_query_at(&self, query: &str, at: DateTime<Utc>) {
        self.query_log.lock().unwrap().insert(query.to_string(), at);
    }

    pub fn query_log_count(&self) -> usize {
        self.query_log.lock().unwrap().len()
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn upsert(&self, posting: &UpstreamPosting) -> Result<JobPostingRow, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|r| r.external_id == posting.job_id) {
            return Ok(existing.clone());
        }
        let row = JobPostingRow::from_upstream(posting, Utc::now());
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_fresh(&self) -> Result<Vec<JobPostingRow>, AppError> {
        let now = Utc::now();
        let mut fresh: Vec<JobPostingRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.expires_at > now)
            .cloned()
            .collect();
        newest_posted_first(&mut fresh);
        Ok(fresh)
    }

    async fn find_by_ids(&self, external_ids: &[String]) -> Result<Vec<JobPostingRow>, AppError> {
        let now = Utc::now();
        let mut hits: Vec<JobPostingRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| external_ids.contains(&r.external_id) && r.expires_at > now)
            .cloned()
            .collect();
        newest_posted_first(&mut hits);
        Ok(hits)
    }

    async fn find_recent_matching(
        &self,
        query_text: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<JobPostingRow>, AppError> {
        let needle = query_text.to_lowercase();
        let matches_row = |r: &JobPostingRow| {
            r.title.to_lowercase().contains(&needle)
                || r.description.to_lowercase().contains(&needle)
                || r.city
                    .as_deref()
                    .map(|c| c.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        };
        let mut hits: Vec<JobPostingRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.ingested_at > since && matches_row(r))
            .cloned()
            .collect();
        newest_posted_first(&mut hits);
        hits.truncate(50);
        Ok(hits)
    }

    async fn query_log_touch(&self, query: &str) -> Result<(), AppError> {
        self.touch_query_now(query);
        Ok(())
    }

    async fn query_log_fresh(&self, query: &str, since: DateTime<Utc>) -> Result<bool, AppError> {
        Ok(self
            .query_log
            .lock()
            .unwrap()
            .get(query)
            .map(|fetched_at| *fetched_at > since)
            .unwrap_or(false))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cache double
// ────────────────────────────────────────────────────────────────────────────

pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CachedRecommendation>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResponseCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<CachedRecommendation> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn put(&self, key: &str, value: &CachedRecommendation) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
    }

    async fn invalidate_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let prefix = format!("jobs:recommend:{user_id}:");
        self.entries
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Source and text-generator stubs
// ────────────────────────────────────────────────────────────────────────────

pub struct StubSource {
    page: JobSearchPage,
    calls: AtomicU32,
}

impl StubSource {
    pub fn with_postings(postings: Vec<UpstreamPosting>) -> Self {
        let total = postings.len() as u64;
        Self::with_page(postings, total)
    }

    pub fn with_page(postings: Vec<UpstreamPosting>, total: u64) -> Self {
        Self {
            page: JobSearchPage { postings, total },
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSource for StubSource {
    async fn fetch(&self, _query: &str, _page: u32, _filters: &SearchFilters) -> JobSearchPage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.page.clone()
    }
}

pub struct StubTextGen {
    response: Option<String>,
    last_prompt: Mutex<Option<String>>,
}

impl StubTextGen {
    pub fn ok(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubTextGen {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.response.clone().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Résumé provider double
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeResumes {
    profiles: HashMap<Uuid, ResumeProfile>,
}

impl FakeResumes {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn with_profile(user_id: Uuid, profile: ResumeProfile) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(user_id, profile);
        Self { profiles }
    }
}

#[async_trait]
impl ResumeProvider for FakeResumes {
    async fn latest_for(&self, user_id: Uuid) -> Result<Option<ResumeProfile>, AppError> {
        Ok(self.profiles.get(&user_id).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store-contract tests for the in-memory doubles
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_first_write_wins() {
        let store = InMemoryStore::new();
        let first = store
            .upsert(&sample_posting("same-id", "Original Title", "desc"))
            .await
            .unwrap();
        let second = store
            .upsert(&sample_posting("same-id", "Different Title", "other desc"))
            .await
            .unwrap();

        assert_eq!(store.row_count(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Original Title");
        assert_eq!(second.ingested_at, first.ingested_at);
        assert_eq!(second.expires_at, first.expires_at);
    }

    #[tokio::test]
    async fn test_find_fresh_excludes_expired_rows_immediately() {
        let store = InMemoryStore::new();
        let mut expired = sample_row("old", "Old Role", "desc");
        expired.expires_at = Utc::now() - Duration::hours(1);
        store.insert_row(expired);
        store
            .upsert(&sample_posting("new", "New Role", "desc"))
            .await
            .unwrap();

        let fresh = store.find_fresh().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].external_id, "new");
    }

    #[tokio::test]
    async fn test_find_fresh_orders_newest_posted_first() {
        let store = InMemoryStore::new();
        let mut older = sample_row("older", "Role A", "desc");
        older.posted_at_timestamp = Some(1_000);
        let mut newer = sample_row("newer", "Role B", "desc");
        newer.posted_at_timestamp = Some(2_000);
        let mut unstamped = sample_row("unstamped", "Role C", "desc");
        unstamped.posted_at_timestamp = None;
        store.insert_row(older);
        store.insert_row(unstamped);
        store.insert_row(newer);

        let fresh = store.find_fresh().await.unwrap();
        let order: Vec<&str> = fresh.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(order, vec!["newer", "older", "unstamped"]);
    }

    #[tokio::test]
    async fn test_find_by_ids_round_trips_ingested_fields() {
        let store = InMemoryStore::new();
        let mut posting = sample_posting("rt-1", "Data Engineer", "Pipelines.");
        posting.employer_name = Some("Initech".to_string());
        store.upsert(&posting).await.unwrap();
        store
            .upsert(&sample_posting("other", "Unrelated", "desc"))
            .await
            .unwrap();

        let rows = store
            .find_by_ids(&["rt-1".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].external_id, "rt-1");
        assert_eq!(rows[0].title, "Data Engineer");
        assert_eq!(rows[0].employer_name.as_deref(), Some("Initech"));
    }

    #[tokio::test]
    async fn test_find_recent_matching_spans_title_description_and_city() {
        let store = InMemoryStore::new();
        store
            .upsert(&sample_posting("t", "React Developer", "frontend"))
            .await
            .unwrap();
        store
            .upsert(&sample_posting("d", "Engineer", "works with React daily"))
            .await
            .unwrap();
        let mut city_hit = sample_posting("c", "Engineer", "backend");
        city_hit.job_city = Some("React City".to_string());
        store.upsert(&city_hit).await.unwrap();
        store
            .upsert(&sample_posting("miss", "Chef", "pasta"))
            .await
            .unwrap();

        let since = Utc::now() - Duration::hours(24);
        let hits = store.find_recent_matching("react", since).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(hits.len(), 3);
        assert!(ids.contains(&"t") && ids.contains(&"d") && ids.contains(&"c"));
    }

    #[tokio::test]
    async fn test_find_recent_matching_respects_since_bound() {
        let store = InMemoryStore::new();
        store
            .upsert(&sample_posting("now", "React Developer", "desc"))
            .await
            .unwrap();

        let future = Utc::now() + Duration::minutes(1);
        let hits = store.find_recent_matching("react", future).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_log_freshness_boundary() {
        let store = InMemoryStore::new();
        store.query_log_touch("react developer").await.unwrap();

        let recent = Utc::now() - Duration::hours(24);
        assert!(store
            .query_log_fresh("react developer", recent)
            .await
            .unwrap());
        assert!(!store.query_log_fresh("rust developer", recent).await.unwrap());

        store.touch_query_at("react developer", Utc::now() - Duration::hours(25));
        assert!(!store
            .query_log_fresh("react developer", recent)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_user_only_drops_that_users_entries() {
        let cache = InMemoryCache::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let entry = CachedRecommendation {
            query: "q".to_string(),
            jobs: vec![],
            total: 0,
            cached_at: Utc::now(),
        };
        cache
            .put(&crate::jobs::cache::recommend_key(user_a, 1), &entry)
            .await;
        cache
            .put(&crate::jobs::cache::recommend_key(user_a, 2), &entry)
            .await;
        cache
            .put(&crate::jobs::cache::recommend_key(user_b, 1), &entry)
            .await;

        cache.invalidate_user(user_a).await.unwrap();
        assert!(cache
            .get(&crate::jobs::cache::recommend_key(user_a, 1))
            .await
            .is_none());
        assert!(cache
            .get(&crate::jobs::cache::recommend_key(user_a, 2))
            .await
            .is_none());
        assert!(cache
            .get(&crate::jobs::cache::recommend_key(user_b, 1))
            .await
            .is_some());
    }
}
