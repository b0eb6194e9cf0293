use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One durable job posting. Identity is `external_id` (assigned by the
/// upstream source) — the sole deduplication key. Rows are immutable after
/// ingestion; freshness is enforced at read time via `expires_at`, never by
/// deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPostingRow {
    pub id: Uuid,
    pub external_id: String,
    pub title: String,
    pub employer_name: Option<String>,
    pub employer_logo: Option<String>,
    pub employer_website: Option<String>,
    pub publisher: Option<String>,
    pub employment_type: Option<String>,
    pub employment_types: Vec<String>,
    pub apply_link: Option<String>,
    pub description: String,
    pub is_remote: bool,
    /// Human-readable posting age as reported upstream ("3 days ago").
    pub posted_at: Option<String>,
    pub posted_at_timestamp: Option<i64>,
    pub posted_at_utc: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub salary_period: Option<String>,
    /// Structured qualifications/responsibilities blob, kept as-is.
    pub highlights: Value,
    pub onet_soc: Option<String>,
    pub onet_job_zone: Option<String>,
    pub ingested_at: DateTime<Utc>,
    /// `ingested_at + 24h`. Never refreshed by re-ingestion.
    pub expires_at: DateTime<Utc>,
}
