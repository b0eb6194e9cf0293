//! Job Store — persistent, deduplicated postings plus the search-mode query
//! log.
//!
//! Postings are append-mostly: `upsert` is idempotent and first-write-wins on
//! `external_id`, rows are never mutated or deleted afterwards, and freshness
//! is a read-time filter on `expires_at` — no reaper process.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::source::UpstreamPosting;
use crate::models::job::JobPostingRow;

/// Freshness window for both posting expiry and the query-log gate.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Result cap for the search-mode DB-cache read.
const RECENT_MATCH_LIMIT: i64 = 50;

impl JobPostingRow {
    /// Maps one upstream posting into a durable row, stamping the freshness
    /// window. Identity comes from the upstream-assigned id.
    pub fn from_upstream(posting: &UpstreamPosting, ingested_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: posting.job_id.clone(),
            title: posting.job_title.clone().unwrap_or_default(),
            employer_name: posting.employer_name.clone(),
            employer_logo: posting.employer_logo.clone(),
            employer_website: posting.employer_website.clone(),
            publisher: posting.job_publisher.clone(),
            employment_type: posting.job_employment_type.clone(),
            employment_types: posting.job_employment_types.clone().unwrap_or_default(),
            apply_link: posting.job_apply_link.clone(),
            description: posting.job_description.clone().unwrap_or_default(),
            is_remote: posting.job_is_remote.unwrap_or(false),
            posted_at: posting.job_posted_at.clone(),
            posted_at_timestamp: posting.job_posted_at_timestamp,
            posted_at_utc: posting.job_posted_at_datetime_utc,
            location: posting.job_location.clone(),
            city: posting.job_city.clone(),
            state: posting.job_state.clone(),
            country: posting.job_country.clone(),
            latitude: posting.job_latitude,
            longitude: posting.job_longitude,
            min_salary: posting.job_min_salary,
            max_salary: posting.job_max_salary,
            salary_period: posting.job_salary_period.clone(),
            highlights: posting
                .job_highlights
                .clone()
                .unwrap_or(serde_json::Value::Null),
            onet_soc: posting.job_onet_soc.clone(),
            onet_job_zone: posting.job_onet_job_zone.clone(),
            ingested_at,
            expires_at: ingested_at + Duration::hours(FRESHNESS_WINDOW_HOURS),
        }
    }
}

/// Persistence seam for postings and the query log.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Idempotent ingestion keyed on `external_id`: a known id returns the
    /// original row unchanged (first write wins), an unknown id inserts a
    /// row whose `expires_at` is stamped 24h out.
    async fn upsert(&self, posting: &UpstreamPosting) -> Result<JobPostingRow, AppError>;

    /// Unexpired postings, newest-posted-first.
    async fn find_fresh(&self) -> Result<Vec<JobPostingRow>, AppError>;

    /// Re-materializes exactly the given upstream ids (unexpired),
    /// newest-posted-first. Used to honor the upstream's pagination contract
    /// instead of mixing in unrelated fresh rows.
    async fn find_by_ids(&self, external_ids: &[String]) -> Result<Vec<JobPostingRow>, AppError>;

    /// Keyword match over title, description, and city for rows ingested
    /// after `since`. Capped at 50 rows, newest-posted-first.
    async fn find_recent_matching(
        &self,
        query_text: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<JobPostingRow>, AppError>;

    /// Records that the upstream was actually queried for this literal
    /// string (insert-or-bump `fetched_at`).
    async fn query_log_touch(&self, query: &str) -> Result<(), AppError>;

    /// True when the literal query string was fetched after `since`.
    async fn query_log_fresh(&self, query: &str, since: DateTime<Utc>) -> Result<bool, AppError>;
}

/// PostgreSQL-backed store.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn upsert(&self, posting: &UpstreamPosting) -> Result<JobPostingRow, AppError> {
        let row = JobPostingRow::from_upstream(posting, Utc::now());

        let inserted: Option<JobPostingRow> = sqlx::query_as(
            r#"
            INSERT INTO jobs
                (id, external_id, title, employer_name, employer_logo, employer_website,
                 publisher, employment_type, employment_types, apply_link, description,
                 is_remote, posted_at, posted_at_timestamp, posted_at_utc, location,
                 city, state, country, latitude, longitude, min_salary, max_salary,
                 salary_period, highlights, onet_soc, onet_job_zone, ingested_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(&row.external_id)
        .bind(&row.title)
        .bind(&row.employer_name)
        .bind(&row.employer_logo)
        .bind(&row.employer_website)
        .bind(&row.publisher)
        .bind(&row.employment_type)
        .bind(&row.employment_types)
        .bind(&row.apply_link)
        .bind(&row.description)
        .bind(row.is_remote)
        .bind(&row.posted_at)
        .bind(row.posted_at_timestamp)
        .bind(row.posted_at_utc)
        .bind(&row.location)
        .bind(&row.city)
        .bind(&row.state)
        .bind(&row.country)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(row.min_salary)
        .bind(row.max_salary)
        .bind(&row.salary_period)
        .bind(&row.highlights)
        .bind(&row.onet_soc)
        .bind(&row.onet_job_zone)
        .bind(row.ingested_at)
        .bind(row.expires_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(stored) => {
                debug!("Ingested posting {}", stored.external_id);
                Ok(stored)
            }
            // Conflict: the original row wins and is returned unchanged.
            None => Ok(
                sqlx::query_as("SELECT * FROM jobs WHERE external_id = $1")
                    .bind(&row.external_id)
                    .fetch_one(&self.pool)
                    .await?,
            ),
        }
    }

    async fn find_fresh(&self) -> Result<Vec<JobPostingRow>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE expires_at > now()
            ORDER BY posted_at_timestamp DESC NULLS LAST
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_by_ids(&self, external_ids: &[String]) -> Result<Vec<JobPostingRow>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE external_id = ANY($1) AND expires_at > now()
            ORDER BY posted_at_timestamp DESC NULLS LAST
            "#,
        )
        .bind(external_ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_recent_matching(
        &self,
        query_text: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<JobPostingRow>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE ingested_at > $2
              AND (title ILIKE '%' || $1 || '%'
                   OR description ILIKE '%' || $1 || '%'
                   OR city ILIKE '%' || $1 || '%')
            ORDER BY posted_at_timestamp DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(query_text)
        .bind(since)
        .bind(RECENT_MATCH_LIMIT)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn query_log_touch(&self, query: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO query_log (query, fetched_at)
            VALUES ($1, now())
            ON CONFLICT (query) DO UPDATE SET fetched_at = EXCLUDED.fetched_at
            "#,
        )
        .bind(query)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_log_fresh(&self, query: &str, since: DateTime<Utc>) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM query_log WHERE query = $1 AND fetched_at > $2)",
        )
        .bind(query)
        .bind(since)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testutil::sample_posting;

    #[test]
    fn test_from_upstream_stamps_freshness_window() {
        let posting = sample_posting("XYZ", "Rust Engineer", "Build services in Rust.");
        let now = Utc::now();
        let row = JobPostingRow::from_upstream(&posting, now);
        assert_eq!(row.external_id, "XYZ");
        assert_eq!(row.ingested_at, now);
        assert_eq!(row.expires_at, now + Duration::hours(24));
    }

    #[test]
    fn test_from_upstream_defaults_missing_fields() {
        let posting = UpstreamPosting {
            job_id: "bare".to_string(),
            job_title: None,
            employer_name: None,
            employer_logo: None,
            employer_website: None,
            job_publisher: None,
            job_employment_type: None,
            job_employment_types: None,
            job_apply_link: None,
            job_description: None,
            job_is_remote: None,
            job_posted_at: None,
            job_posted_at_timestamp: None,
            job_posted_at_datetime_utc: None,
            job_location: None,
            job_city: None,
            job_state: None,
            job_country: None,
            job_latitude: None,
            job_longitude: None,
            job_min_salary: None,
            job_max_salary: None,
            job_salary_period: None,
            job_highlights: None,
            job_onet_soc: None,
            job_onet_job_zone: None,
        };
        let row = JobPostingRow::from_upstream(&posting, Utc::now());
        assert_eq!(row.title, "");
        assert_eq!(row.description, "");
        assert!(!row.is_remote);
        assert!(row.employment_types.is_empty());
        assert!(row.highlights.is_null());
    }
}
