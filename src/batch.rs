//! Batch-Get Coordinator
//!
//! Wraps a multi-key batch fetch function. Requested keys are partitioned
//! into cached and missing; the missing set is fetched with exactly one
//! batch call, written back best-effort, and merged with the cached hits.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::aside::FetchFuture;
use crate::cache::CacheManager;
use crate::error::{CacheError, Result};

type BatchFetchFn<T> = Arc<dyn Fn(Vec<String>) -> FetchFuture<HashMap<String, T>> + Send + Sync>;

// == Batch Coordinator ==
/// Read-through batching over the general tier.
///
/// The result contains an entry for every key present in the fetch
/// function's result map plus every cached hit; a key the fetcher omits
/// stays absent — nothing is synthesized for it. A fetch error fails the
/// whole call with no partial result.
pub struct BatchCoordinator<T> {
    cache: Arc<CacheManager>,
    fetch: BatchFetchFn<T>,
    key_prefix: String,
}

impl<T> BatchCoordinator<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Creates a coordinator around `fetch`. The fetch function receives
    /// only the unprefixed keys that missed the cache.
    pub fn new<F, Fut>(cache: Arc<CacheManager>, key_prefix: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<HashMap<String, T>>> + Send + 'static,
    {
        Self {
            cache,
            fetch: Arc::new(move |keys| Box::pin(fetch(keys)) as FetchFuture<HashMap<String, T>>),
            key_prefix: key_prefix.into(),
        }
    }

    // == Batch Get ==
    /// Looks up every requested key, fetches the missing ones in a single
    /// batch call, and returns the merged map.
    ///
    /// Fetched values are written back with the tier's default TTL;
    /// write-back failures are logged and swallowed, since a cache write
    /// failure must never mask a successful fetch.
    pub async fn batch_get(&self, keys: &[String]) -> Result<HashMap<String, T>> {
        let mut merged = HashMap::new();
        let mut missing = Vec::new();

        for key in keys {
            match self.cache.get(&self.full_key(key)).await {
                Some(cached) => {
                    let value = serde_json::from_value(cached)?;
                    merged.insert(key.clone(), value);
                }
                None => missing.push(key.clone()),
            }
        }

        if missing.is_empty() {
            return Ok(merged);
        }

        let fetched = (self.fetch)(missing.clone())
            .await
            .map_err(|e| CacheError::fetch(missing.join(","), e))?;

        for (key, value) in fetched {
            match serde_json::to_value(&value) {
                Ok(json) => {
                    if let Err(e) = self.cache.set(&self.full_key(&key), json, None).await {
                        warn!(key = %key, error = %e, "batch write-back failed");
                    }
                }
                Err(e) => warn!(key = %key, error = %e, "batch value not serializable"),
            }
            merged.insert(key, value);
        }

        Ok(merged)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}
