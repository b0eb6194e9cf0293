//! Response Cache — Redis-backed cache for final ranked recommend-mode
//! responses, keyed by requester and page.
//!
//! Failure policy: a failed read counts as a miss, a failed write is logged
//! and swallowed, a failed invalidation propagates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::ranker::RankedPosting;

/// TTL for cached recommend-mode responses.
pub const RESPONSE_TTL_SECS: u64 = 24 * 60 * 60;

/// The cached value: the full ranked response plus the query that produced
/// it, replayed verbatim on a hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRecommendation {
    pub query: String,
    pub jobs: Vec<RankedPosting>,
    pub total: u64,
    pub cached_at: DateTime<Utc>,
}

/// Cache key for one (requester, page) query shape.
pub fn recommend_key(user_id: Uuid, page: u32) -> String {
    format!("jobs:recommend:{user_id}:{page}")
}

fn user_key_pattern(user_id: Uuid) -> String {
    format!("jobs:recommend:{user_id}:*")
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Cached response for `key`, or `None` on miss. Transport failures are
    /// logged and reported as a miss.
    async fn get(&self, key: &str) -> Option<CachedRecommendation>;

    /// Stores `value` under `key` with the standard TTL. Transport failures
    /// are logged and swallowed.
    async fn put(&self, key: &str, value: &CachedRecommendation);

    /// Drops every cached response for `user_id`, across all pages. Called
    /// when the subject's résumé changes.
    async fn invalidate_user(&self, user_id: Uuid) -> Result<(), AppError>;
}

/// Redis implementation over a multiplexed async connection.
pub struct RedisResponseCache {
    client: redis::Client,
}

impl RedisResponseCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn read(&self, key: &str) -> Result<Option<CachedRecommendation>, AppError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        let raw: Option<String> = con
            .get(key)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(|e| {
                AppError::Cache(format!("corrupt cache entry under {key}: {e}"))
            })?)),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, value: &CachedRecommendation) -> Result<(), AppError> {
        let json = serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        let _: () = con
            .set_ex(key, json, RESPONSE_TTL_SECS)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get(&self, key: &str) -> Option<CachedRecommendation> {
        match self.read(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Response cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &CachedRecommendation) {
        if let Err(e) = self.write(key, value).await {
            warn!("Response cache write failed: {e}");
        }
    }

    async fn invalidate_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        let pattern = user_key_pattern(user_id);
        let keys: Vec<String> = {
            let mut iter = con
                .scan_match::<_, String>(&pattern)
                .await
                .map_err(|e| AppError::Cache(e.to_string()))?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if !keys.is_empty() {
            let _: () = con
                .del(&keys)
                .await
                .map_err(|e| AppError::Cache(e.to_string()))?;
        }
        Ok(())
    }
}
