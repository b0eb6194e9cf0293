//! External Job Source Client — fetches postings from the JSearch RapidAPI.
//!
//! The upstream is slow and occasionally failing; job availability is
//! best-effort. Any transport error, timeout, or non-2xx response degrades to
//! an empty page so the pipeline answers "no jobs found" instead of failing
//! the whole request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

const FETCH_TIMEOUT_SECS: u64 = 15;

/// Internal filter set forwarded to the upstream search call.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub date_posted: Option<String>,
    pub country: Option<String>,
    pub employment_types: Option<Vec<String>>,
    pub remote: Option<bool>,
    pub radius: Option<u32>,
    pub exclude_publishers: Option<String>,
}

/// One page of upstream results.
#[derive(Debug, Clone, Default)]
pub struct JobSearchPage {
    pub postings: Vec<UpstreamPosting>,
    pub total: u64,
}

/// Raw posting as returned by the upstream API. Field names are the
/// upstream's; everything except the id is optional in practice.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamPosting {
    pub job_id: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub employer_name: Option<String>,
    #[serde(default)]
    pub employer_logo: Option<String>,
    #[serde(default)]
    pub employer_website: Option<String>,
    #[serde(default)]
    pub job_publisher: Option<String>,
    #[serde(default)]
    pub job_employment_type: Option<String>,
    #[serde(default)]
    pub job_employment_types: Option<Vec<String>>,
    #[serde(default)]
    pub job_apply_link: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub job_is_remote: Option<bool>,
    #[serde(default)]
    pub job_posted_at: Option<String>,
    #[serde(default)]
    pub job_posted_at_timestamp: Option<i64>,
    #[serde(default)]
    pub job_posted_at_datetime_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub job_location: Option<String>,
    #[serde(default)]
    pub job_city: Option<String>,
    #[serde(default)]
    pub job_state: Option<String>,
    #[serde(default)]
    pub job_country: Option<String>,
    #[serde(default)]
    pub job_latitude: Option<f64>,
    #[serde(default)]
    pub job_longitude: Option<f64>,
    #[serde(default)]
    pub job_min_salary: Option<f64>,
    #[serde(default)]
    pub job_max_salary: Option<f64>,
    #[serde(default)]
    pub job_salary_period: Option<String>,
    #[serde(default)]
    pub job_highlights: Option<Value>,
    #[serde(default)]
    pub job_onet_soc: Option<String>,
    #[serde(default)]
    pub job_onet_job_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<UpstreamPosting>,
    #[serde(default)]
    total: Option<u64>,
}

/// The external job source consumed by the pipeline.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetches one page of postings for `query`. Upstream failures are
    /// reported as an empty page, never as an error.
    async fn fetch(&self, query: &str, page: u32, filters: &SearchFilters) -> JobSearchPage;
}

/// JSearch (RapidAPI) client.
pub struct JSearchClient {
    client: Client,
    host: String,
    api_key: String,
}

impl JSearchClient {
    pub fn new(host: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            host,
            api_key,
        }
    }
}

/// Maps internal filter names to the upstream API's parameter names.
pub fn build_query_params(query: &str, page: u32, filters: &SearchFilters) -> Vec<(String, String)> {
    let mut params = vec![
        ("query".to_string(), query.to_string()),
        ("page".to_string(), page.to_string()),
        ("num_pages".to_string(), "1".to_string()),
        (
            "date_posted".to_string(),
            filters
                .date_posted
                .clone()
                .unwrap_or_else(|| "today".to_string()),
        ),
    ];
    if let Some(country) = &filters.country {
        params.push(("country".to_string(), country.clone()));
    }
    if let Some(types) = &filters.employment_types {
        if !types.is_empty() {
            params.push(("employment_types".to_string(), types.join(",")));
        }
    }
    if let Some(remote) = filters.remote {
        params.push(("work_from_home".to_string(), remote.to_string()));
    }
    if let Some(radius) = filters.radius {
        params.push(("radius".to_string(), radius.to_string()));
    }
    if let Some(excluded) = &filters.exclude_publishers {
        params.push(("exclude_job_publishers".to_string(), excluded.clone()));
    }
    params
}

#[async_trait]
impl JobSource for JSearchClient {
    async fn fetch(&self, query: &str, page: u32, filters: &SearchFilters) -> JobSearchPage {
        let url = format!("https://{}/search", self.host);
        let params = build_query_params(query, page, filters);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("Job source request failed: {e}");
                return JobSearchPage::default();
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Job source returned {status}: {body}");
            return JobSearchPage::default();
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => {
                let total = parsed.total.unwrap_or(parsed.data.len() as u64);
                JobSearchPage {
                    postings: parsed.data,
                    total,
                }
            }
            Err(e) => {
                warn!("Job source returned malformed payload: {e}");
                JobSearchPage::default()
            }
        }
    }
}
