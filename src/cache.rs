//! In-memory response cache for the home page.
//!
//! Entries expire by TTL only. Creating a post does not invalidate anything,
//! so the home page may lag behind new posts for up to one TTL window.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

/// Key prefix of the cached home page listing.
pub const HOME_PAGE_PREFIX: &str = "index_page";

const CACHE_CAPACITY: u64 = 1000;

#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub json: String,
    pub cached_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
pub struct PageCache {
    inner: Cache<String, CachedEntry>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn home_page_key(page: Option<&str>) -> String {
        let page = page
            .map(str::trim)
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(1);
        format!("{HOME_PAGE_PREFIX}:{page}")
    }

    /// Return the cached value for `key`, or compute, store and return it.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(entry) = self.inner.get(key).await {
            match serde_json::from_str(&entry.json) {
                Ok(value) => {
                    tracing::debug!(key = %key, cached_at = %entry.cached_at, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "failed to deserialize cached entry");
                }
            }
        }

        tracing::debug!(key = %key, "cache miss, computing");
        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(json) => {
                let entry = CachedEntry {
                    json,
                    cached_at: chrono::Utc::now(),
                };
                self.inner.insert(key.to_string(), entry).await;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize for cache");
            }
        }

        Ok(value)
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
        tracing::info!("Response cache cleared");
    }
}
