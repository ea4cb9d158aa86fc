//! Memoizer Module
//!
//! Generic read-through caching for arbitrary async functions. Keys are
//! derived from the function's identity plus its canonically-serialized
//! arguments, or supplied directly by the caller. Results live in the
//! general tier.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::cache::CacheManager;
use crate::error::{CacheError, Result};
use crate::flight::FlightGroup;
use crate::key;

// == Memoizer ==
/// Caches the results of async computations under derived or caller-
/// supplied keys, with the same miss coalescing as [`crate::CacheAside`]:
/// concurrent callers computing the same key run the computation once.
pub struct Memoizer {
    cache: Arc<CacheManager>,
    ttl: Option<Duration>,
    flights: FlightGroup,
}

impl Memoizer {
    /// Creates a memoizer storing results with the tier's default TTL.
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self {
            cache,
            ttl: None,
            flights: FlightGroup::new(),
        }
    }

    /// Overrides the TTL applied to memoized results.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    // == Memoize ==
    /// Runs `f` unless a result is already cached for this function
    /// identity and argument set. Arguments are canonically serialized, so
    /// logically equal argument objects share a key regardless of field
    /// order.
    pub async fn memoize<A, T, F, Fut>(&self, fn_name: &str, args: &A, f: F) -> Result<T>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let args_value = serde_json::to_value(args)?;
        let cache_key = key::memo_key(fn_name, &args_value);
        self.get_or_fill(&cache_key, f).await
    }

    /// Memoizes under a caller-supplied key instead of a derived one.
    pub async fn memoize_with_key<T, F, Fut>(&self, cache_key: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.get_or_fill(cache_key, f).await
    }

    /// Drops a memoized result by its derived key.
    pub async fn invalidate<A: Serialize>(&self, fn_name: &str, args: &A) -> Result<bool> {
        let args_value = serde_json::to_value(args)?;
        Ok(self.cache.delete(&key::memo_key(fn_name, &args_value)).await)
    }

    // == Internal ==
    async fn get_or_fill<T, F, Fut>(&self, cache_key: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.flights
            .with_key(cache_key, || async {
                if let Some(cached) = self.cache.get(cache_key).await {
                    return serde_json::from_value(cached).map_err(CacheError::from);
                }

                let computed = f().await.map_err(|e| CacheError::fetch(cache_key, e))?;

                match serde_json::to_value(&computed) {
                    Ok(value) => {
                        if let Err(e) = self.cache.set(cache_key, value, self.ttl).await {
                            warn!(key = %cache_key, error = %e, "memoizer write-back failed");
                        }
                    }
                    Err(e) => warn!(key = %cache_key, error = %e, "memoized value not serializable"),
                }

                Ok(computed)
            })
            .await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_memoize_computes_once() {
        let memo = Memoizer::new(Arc::new(CacheManager::default()));
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(99u64)
        };

        let first: u64 = memo.memoize("answer", &json!({"q": 1}), compute).await.unwrap();
        let second: u64 = memo
            .memoize("answer", &json!({"q": 1}), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0u64)
            })
            .await
            .unwrap();

        assert_eq!(first, 99);
        assert_eq!(second, 99, "second call must come from cache");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_argument_field_order_shares_key() {
        let memo = Memoizer::new(Arc::new(CacheManager::default()));

        let first: i64 = memo
            .memoize("score", &json!({"a": 1, "b": 2}), || async { Ok(10) })
            .await
            .unwrap();
        let second: i64 = memo
            .memoize("score", &json!({"b": 2, "a": 1}), || async { Ok(20) })
            .await
            .unwrap();

        assert_eq!(first, second, "shuffled argument fields must share a key");
    }

    #[tokio::test]
    async fn test_distinct_identities_do_not_collide() {
        let memo = Memoizer::new(Arc::new(CacheManager::default()));

        let a: i64 = memo.memoize("f", &json!({"x": 1}), || async { Ok(1) }).await.unwrap();
        let b: i64 = memo.memoize("g", &json!({"x": 1}), || async { Ok(2) }).await.unwrap();
        let c: i64 = memo.memoize("f", &json!({"x": 2}), || async { Ok(3) }).await.unwrap();

        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_memoize_with_key() {
        let cache = Arc::new(CacheManager::default());
        let memo = Memoizer::new(Arc::clone(&cache));

        let value: String = memo
            .memoize_with_key("report:weekly", || async { Ok("ready".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "ready");
        assert!(cache.has("report:weekly").await);
    }

    #[tokio::test]
    async fn test_error_propagates_and_is_not_cached() {
        let memo = Memoizer::new(Arc::new(CacheManager::default()));

        let failed: Result<u64> = memo
            .memoize_with_key("flaky", || async { anyhow::bail!("transient") })
            .await;
        assert!(matches!(failed, Err(CacheError::Fetch { .. })));

        let recovered: u64 = memo
            .memoize_with_key("flaky", || async { Ok(5) })
            .await
            .unwrap();
        assert_eq!(recovered, 5, "a failed computation must not be cached");
    }

    #[tokio::test]
    async fn test_invalidate() {
        let memo = Memoizer::new(Arc::new(CacheManager::default()));

        let _: i64 = memo.memoize("f", &json!({"x": 1}), || async { Ok(1) }).await.unwrap();
        assert!(memo.invalidate("f", &json!({"x": 1})).await.unwrap());

        let recomputed: i64 = memo
            .memoize("f", &json!({"x": 1}), || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(recomputed, 2);
    }

    #[tokio::test]
    async fn test_ttl_override() {
        let memo = Memoizer::new(Arc::new(CacheManager::default()))
            .with_ttl(Duration::from_millis(40));

        let _: i64 = memo.memoize_with_key("short", || async { Ok(1) }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let recomputed: i64 = memo.memoize_with_key("short", || async { Ok(2) }).await.unwrap();
        assert_eq!(recomputed, 2, "entry should have expired");
    }
}
