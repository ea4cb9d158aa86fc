//! Cache Manager Module
//!
//! Owns the four named tiers and exposes the unified
//! get/set/batch/invalidate/stats surface. General-purpose operations work
//! on the general tier; embeddings, search results, and user context have
//! dedicated methods with tier-specific key derivation baked in.
//!
//! The manager is constructed explicitly and injected wherever caching is
//! needed; there is no global instance, so tests get isolated caches.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheStats, TierStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::key;
use crate::models::CachedSearchResults;

// == Tier ==
/// Names the four tiers for per-tier operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    General,
    Embeddings,
    SearchResults,
    Preferences,
}

// == Invalidation ==
/// Outcome of an invalidation call. A full clear and a pattern sweep are
/// distinct results, not overloaded counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Every tier was cleared
    ClearedAll,
    /// Pattern invalidation removed this many entries across tiers
    Removed(usize),
}

// == Cache Manager ==
/// Multi-tier cache with TTL expiry and LRU eviction.
///
/// Tier state lives behind `tokio::sync::RwLock`; every store operation is
/// atomic. The manager is cheap to share via `Arc`.
pub struct CacheManager {
    general: RwLock<TierStore<Value>>,
    embeddings: RwLock<TierStore<Vec<f32>>>,
    search_results: RwLock<TierStore<CachedSearchResults>>,
    preferences: RwLock<TierStore<Value>>,
}

impl CacheManager {
    // == Constructors ==
    /// Creates a manager with the given tier configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            general: RwLock::new(TierStore::new(config.general)),
            // Embedding entries are weighted by vector length
            embeddings: RwLock::new(TierStore::with_weigher(config.embeddings, |v: &Vec<f32>| {
                v.len()
            })),
            search_results: RwLock::new(TierStore::new(config.search_results)),
            preferences: RwLock::new(TierStore::new(config.preferences)),
        }
    }

    // == General Tier ==
    /// Retrieves a value from the general tier.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.general.write().await.get(key)
    }

    /// Stores a value in the general tier with an optional TTL override.
    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        self.general.write().await.set(key, value, ttl)
    }

    /// TTL-aware existence check on the general tier.
    pub async fn has(&self, key: &str) -> bool {
        self.general.write().await.has(key)
    }

    /// Deletes a general-tier entry. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> bool {
        self.general.write().await.delete(key)
    }

    /// Retrieves multiple general-tier values, one `Option` per requested
    /// key, in request order.
    pub async fn mget(&self, keys: &[String]) -> Vec<Option<Value>> {
        let mut tier = self.general.write().await;
        keys.iter().map(|key| tier.get(key)).collect()
    }

    /// Stores multiple general-tier pairs with a shared optional TTL.
    pub async fn mset(&self, pairs: Vec<(String, Value)>, ttl: Option<Duration>) -> Result<()> {
        let mut tier = self.general.write().await;
        for (key, value) in pairs {
            tier.set(&key, value, ttl)?;
        }
        Ok(())
    }

    // == Embeddings Tier ==
    /// Caches an embedding vector under the normalized text's derived key.
    pub async fn cache_embeddings(&self, text: &str, vector: Vec<f32>) -> Result<()> {
        let key = key::embedding_key(text);
        self.embeddings.write().await.set(&key, vector, None)
    }

    /// Retrieves a cached embedding vector for the given text.
    pub async fn get_cached_embeddings(&self, text: &str) -> Option<Vec<f32>> {
        let key = key::embedding_key(text);
        self.embeddings.write().await.get(&key)
    }

    // == Search Results Tier ==
    /// Caches search results along with their originating query, type, and
    /// filters, stamped with the current time.
    pub async fn cache_search_results(
        &self,
        query: &str,
        search_type: &str,
        filters: Value,
        results: Vec<Value>,
    ) -> Result<()> {
        let key = key::search_key(query, search_type, &filters);
        let payload = CachedSearchResults::new(query, search_type, filters, results);
        self.search_results.write().await.set(&key, payload, None)
    }

    /// Retrieves cached search results for a query/type/filter combination.
    /// Filter field order does not affect the lookup.
    pub async fn get_cached_search_results(
        &self,
        query: &str,
        search_type: &str,
        filters: &Value,
    ) -> Option<CachedSearchResults> {
        let key = key::search_key(query, search_type, filters);
        self.search_results.write().await.get(&key)
    }

    // == Preferences Tier ==
    /// Caches a user's context/preferences payload.
    pub async fn cache_user_context(&self, user_id: &str, context: Value) -> Result<()> {
        let key = key::user_context_key(user_id);
        self.preferences.write().await.set(&key, context, None)
    }

    /// Retrieves a user's cached context/preferences payload.
    pub async fn get_cached_user_context(&self, user_id: &str) -> Option<Value> {
        let key = key::user_context_key(user_id);
        self.preferences.write().await.get(&key)
    }

    // == Invalidation ==
    /// Invalidates cache contents.
    ///
    /// With no pattern, clears every tier and returns
    /// [`Invalidation::ClearedAll`]. With a pattern, removes entries whose
    /// key contains the pattern as a substring — across all tiers — and
    /// returns [`Invalidation::Removed`] with the count (zero matches is
    /// `Removed(0)`, distinct from a full clear).
    pub async fn invalidate(&self, pattern: Option<&str>) -> Invalidation {
        match pattern {
            None => {
                self.general.write().await.clear();
                self.embeddings.write().await.clear();
                self.search_results.write().await.clear();
                self.preferences.write().await.clear();
                debug!("invalidated all tiers");
                Invalidation::ClearedAll
            }
            Some(pattern) => {
                let mut removed = 0;
                for tier in [
                    Tier::General,
                    Tier::Embeddings,
                    Tier::SearchResults,
                    Tier::Preferences,
                ] {
                    removed += self.invalidate_tier(tier, pattern).await;
                }
                debug!(pattern, removed, "pattern invalidation");
                Invalidation::Removed(removed)
            }
        }
    }

    /// Removes entries whose key contains `pattern` from a single tier.
    /// Returns the number removed.
    pub async fn invalidate_tier(&self, tier: Tier, pattern: &str) -> usize {
        match tier {
            Tier::General => sweep(&self.general, pattern).await,
            Tier::Embeddings => sweep(&self.embeddings, pattern).await,
            Tier::SearchResults => sweep(&self.search_results, pattern).await,
            Tier::Preferences => sweep(&self.preferences, pattern).await,
        }
    }

    // == Stats ==
    /// Per-tier statistics: entry counts, weights where tracked, and
    /// hit/miss/eviction/expiration counters.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            general: self.general.read().await.stats(),
            embeddings: self.embeddings.read().await.stats(),
            search_results: self.search_results.read().await.stats(),
            preferences: self.preferences.read().await.stats(),
        }
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Substring sweep over one tier's key snapshot.
async fn sweep<V: Clone>(tier: &RwLock<TierStore<V>>, pattern: &str) -> usize {
    let mut store = tier.write().await;
    let matches: Vec<String> = store
        .keys()
        .into_iter()
        .filter(|key| key.contains(pattern))
        .collect();

    let mut removed = 0;
    for key in matches {
        if store.delete(&key) {
            removed += 1;
        }
    }
    removed
}
