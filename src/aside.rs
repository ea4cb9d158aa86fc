//! Cache-Aside Wrapper
//!
//! Wraps a single-key async fetch function with read-through caching over
//! the general tier: check the cache, fetch on miss, write the result back,
//! return the domain value. Concurrent misses on the same key are coalesced
//! so the backing source sees one fetch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::cache::CacheManager;
use crate::error::{CacheError, Result};
use crate::flight::FlightGroup;

pub(crate) type FetchFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;
type FetchFn<T> = Arc<dyn Fn(String) -> FetchFuture<T> + Send + Sync>;

// == Options ==
/// Construction options for [`CacheAside`].
#[derive(Debug, Clone)]
pub struct CacheAsideOptions {
    /// TTL override for filled entries (tier default when None)
    pub ttl: Option<Duration>,
    /// Prefix namespacing this wrapper's keys in the general tier
    pub key_prefix: String,
}

impl CacheAsideOptions {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            ttl: None,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

// == Cache Aside ==
/// Read-through cache over a single-key fetch function.
///
/// Values are stored as JSON in the general tier and deserialized on hit;
/// on miss the caller receives the fetched domain value directly, so the
/// hit and miss paths return the same type.
pub struct CacheAside<T> {
    cache: Arc<CacheManager>,
    fetch: FetchFn<T>,
    options: CacheAsideOptions,
    flights: FlightGroup,
}

impl<T> CacheAside<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Creates a wrapper around `fetch`. The fetch function receives the
    /// unprefixed key and is never retried by the cache layer.
    pub fn new<F, Fut>(cache: Arc<CacheManager>, options: CacheAsideOptions, fetch: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            cache,
            fetch: Arc::new(move |key| Box::pin(fetch(key)) as FetchFuture<T>),
            options,
            flights: FlightGroup::new(),
        }
    }

    // == Get ==
    /// Returns the cached value for `key`, fetching and filling on miss.
    ///
    /// Concurrent callers missing on the same key are coalesced: the first
    /// fetches, the rest wait and read the filled entry. A fetch error
    /// propagates to the caller that triggered it; waiting callers then
    /// retry with a fresh fetch of their own.
    pub async fn get(&self, key: &str) -> Result<T> {
        let full_key = self.full_key(key);

        self.flights
            .with_key(&full_key, || async {
                if let Some(cached) = self.cache.get(&full_key).await {
                    return serde_json::from_value(cached).map_err(CacheError::from);
                }

                let fetched = (self.fetch)(key.to_string())
                    .await
                    .map_err(|e| CacheError::fetch(key, e))?;

                // A cache write failure must never mask a successful fetch
                match serde_json::to_value(&fetched) {
                    Ok(value) => {
                        if let Err(e) = self.cache.set(&full_key, value, self.options.ttl).await {
                            warn!(key = %full_key, error = %e, "cache-aside write-back failed");
                        }
                    }
                    Err(e) => {
                        warn!(key = %full_key, error = %e, "cache-aside value not serializable");
                    }
                }

                Ok(fetched)
            })
            .await
    }

    // == Invalidate ==
    /// Deletes the cached entry for `key`. Returns whether anything was
    /// removed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.cache.delete(&self.full_key(key)).await
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.options.key_prefix, key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Board {
        id: String,
        revision: usize,
    }

    fn counting_aside(cache: Arc<CacheManager>, calls: Arc<AtomicUsize>) -> CacheAside<Board> {
        CacheAside::new(cache, CacheAsideOptions::new("board"), move |key: String| {
            let calls = Arc::clone(&calls);
            async move {
                let revision = calls.fetch_add(1, Ordering::SeqCst);
                Ok(Board { id: key, revision })
            }
        })
    }

    #[tokio::test]
    async fn test_fetches_once_for_sequential_gets() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aside = counting_aside(Arc::new(CacheManager::default()), Arc::clone(&calls));

        let first = aside.get("42").await.unwrap();
        let second = aside.get("42").await.unwrap();

        // The fetch function returns a distinct value each call; both gets
        // must see the first one
        assert_eq!(first, second);
        assert_eq!(first.revision, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_separately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aside = counting_aside(Arc::new(CacheManager::default()), Arc::clone(&calls));

        let a = aside.get("a").await.unwrap();
        let b = aside.get("b").await.unwrap();

        assert_eq!(a.id, "a");
        assert_eq!(b.id, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(CacheManager::default());
        let calls_in_fetch = Arc::clone(&calls);
        let aside = Arc::new(CacheAside::new(
            cache,
            CacheAsideOptions::new("board"),
            move |key: String| {
                let calls = Arc::clone(&calls_in_fetch);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(Board { id: key, revision: 0 })
                }
            },
        ));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let aside = Arc::clone(&aside);
            handles.push(tokio::spawn(async move { aside.get("42").await.unwrap() }));
        }

        let mut boards = Vec::new();
        for handle in handles {
            boards.push(handle.await.unwrap());
        }

        assert!(boards.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "concurrent misses on one key must fetch once"
        );
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aside = counting_aside(Arc::new(CacheManager::default()), Arc::clone(&calls));

        let first = aside.get("42").await.unwrap();
        assert!(aside.invalidate("42").await);
        let second = aside.get("42").await.unwrap();

        assert_ne!(first.revision, second.revision);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_next_call_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(CacheManager::default());
        let calls_in_fetch = Arc::clone(&calls);
        let aside: CacheAside<Board> = CacheAside::new(
            cache,
            CacheAsideOptions::new("board"),
            move |key: String| {
                let calls = Arc::clone(&calls_in_fetch);
                async move {
                    let attempt = calls.fetch_add(1, Ordering::SeqCst);
                    if attempt == 0 {
                        anyhow::bail!("source unavailable");
                    }
                    Ok(Board { id: key, revision: attempt })
                }
            },
        );

        let err = aside.get("42").await.unwrap_err();
        assert!(matches!(err, CacheError::Fetch { .. }));

        // The failed attempt did not poison the key
        let board = aside.get("42").await.unwrap();
        assert_eq!(board.revision, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_keys_are_namespaced_by_prefix() {
        let cache = Arc::new(CacheManager::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let aside = counting_aside(Arc::clone(&cache), calls);

        aside.get("42").await.unwrap();

        assert!(cache.has("board:42").await);
        assert!(!cache.has("42").await);
    }

    #[tokio::test]
    async fn test_ttl_option_applies() {
        let cache = Arc::new(CacheManager::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_fetch = Arc::clone(&calls);
        let aside = CacheAside::new(
            Arc::clone(&cache),
            CacheAsideOptions::new("board").with_ttl(Duration::from_millis(40)),
            move |key: String| {
                let calls = Arc::clone(&calls_in_fetch);
                async move {
                    let revision = calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Board { id: key, revision })
                }
            },
        );

        aside.get("42").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let refreshed = aside.get("42").await.unwrap();

        assert_eq!(refreshed.revision, 1, "entry should have expired and refetched");
    }
}
