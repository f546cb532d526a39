//! Rate-limited cache gateway.
//!
//! Wraps remote lookups with a durable cache keyed by request identity and a
//! process-wide [`RequestThrottle`]. One gateway is created at startup and
//! shared by every request handler.

mod throttle;

pub use throttle::{RequestThrottle, ThrottleSettings, ThrottleStats};

use crate::cache_store::CacheStore;
use crate::server::metrics::record_cache_lookup;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures of the cache layer itself. These always fail the caller: there is
/// no silent fallback to calling the producer without a working cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0:#}")]
    Store(anyhow::Error),

    #[error("failed to serialize value for cache key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayStats {
    pub cached_entries: usize,
    pub throttle: ThrottleStats,
}

pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    throttle: Arc<RequestThrottle>,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>, throttle: Arc<RequestThrottle>) -> Self {
        Self { store, throttle }
    }

    /// Returns the cached value for `key`, or runs `producer` through the
    /// throttle and caches what it returns.
    pub async fn execute<T, E, F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let throttle = self.throttle.clone();
        self.cached(key, || async move { throttle.run(producer()).await })
            .await
    }

    /// Cache-only half of [`execute`](Self::execute). The producer is free to
    /// make several throttled calls of its own.
    pub async fn cached<T, E, F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(raw) = self.store.get(key).map_err(CacheError::Store)? {
            match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!("Cache hit for {}", key);
                    record_cache_lookup("hit");
                    return Ok(value);
                }
                Err(err) => {
                    warn!("Discarding unreadable cache entry {}: {}", key, err);
                }
            }
        }

        debug!("Cache miss for {}", key);
        record_cache_lookup("miss");

        // Producer failures propagate before anything is written.
        let value = producer().await?;

        let raw = serde_json::to_string(&value).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw).map_err(CacheError::Store)?;
        Ok(value)
    }

    /// Throttle-only half of [`execute`](Self::execute).
    pub async fn throttled<T, F>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        self.throttle.run(call).await
    }

    pub async fn stats(&self) -> anyhow::Result<GatewayStats> {
        Ok(GatewayStats {
            cached_entries: self.store.len()?,
            throttle: self.throttle.stats().await,
        })
    }
}
