//! Tier Store Module
//!
//! A single cache tier: HashMap storage combined with LRU tracking, lazy
//! TTL expiration, and capacity enforcement by entry count and optionally
//! by cumulative weight.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, LruTracker, TierStats, MAX_KEY_LENGTH};
use crate::config::{ExpiryPolicy, TierConfig};
use crate::error::{CacheError, Result};

/// Computes an entry's weighted size at admission time.
pub type Weigher<V> = Box<dyn Fn(&V) -> usize + Send + Sync>;

// == Tier Store ==
/// Capacity- and TTL-bounded key/value store with LRU eviction.
///
/// Expired entries are reclaimed lazily, on the first touch after expiry,
/// or earlier if evicted for capacity. There is no background sweep.
pub struct TierStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Recency tracking for eviction
    lru: LruTracker,
    /// Performance counters
    stats: TierStats,
    /// Capacity, TTL, and expiry policy
    config: TierConfig,
    /// Optional weighted-size function
    weigher: Option<Weigher<V>>,
    /// Cumulative weight of live entries
    total_weight: usize,
}

impl<V> std::fmt::Debug for TierStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierStore")
            .field("entries", &self.entries.len())
            .field("total_weight", &self.total_weight)
            .field("config", &self.config)
            .finish()
    }
}

impl<V: Clone> TierStore<V> {
    // == Constructors ==
    /// Creates an unweighted tier store.
    pub fn new(config: TierConfig) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: TierStats::new(),
            config,
            weigher: None,
            total_weight: 0,
        }
    }

    /// Creates a tier store that tracks cumulative weight with the given
    /// weigher (e.g. vector length for embedding tiers).
    pub fn with_weigher(config: TierConfig, weigher: impl Fn(&V) -> usize + Send + Sync + 'static) -> Self {
        let mut store = Self::new(config);
        store.weigher = Some(Box::new(weigher));
        store
    }

    // == Set ==
    /// Stores a key-value pair with an optional TTL override.
    ///
    /// Overwrites reset value, expiry, and recency. If the insertion pushes
    /// the tier past its entry or weight capacity, least-recently-used
    /// entries are evicted until the tier is back within bounds.
    pub fn set(&mut self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::KeyTooLong(key.len()));
        }

        let weight = self.weigher.as_ref().map_or(0, |w| w(&value));
        let effective_ttl = ttl.or(Some(self.config.ttl));
        let entry = CacheEntry::new(value, effective_ttl, weight);

        if let Some(old) = self.entries.insert(key.to_string(), entry) {
            self.total_weight -= old.weight;
        }
        self.total_weight += weight;
        self.lru.touch(key);

        self.evict_to_capacity();
        self.refresh_live_stats();
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key. Expired entries are removed by this check
    /// and counted as a miss.
    ///
    /// On sliding tiers, a hit refreshes the entry's recency and re-arms
    /// its TTL window; on fixed tiers a read changes nothing.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if self.remove_if_expired(key) {
            self.stats.record_miss();
            return None;
        }

        let sliding = self.config.expiry == ExpiryPolicy::Sliding;
        match self.entries.get_mut(key) {
            Some(entry) => {
                if sliding {
                    entry.slide();
                }
                let value = entry.value.clone();
                if sliding {
                    self.lru.touch(key);
                }
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// TTL-aware containment probe. Removes an expired entry but never
    /// refreshes recency, even on sliding tiers.
    pub fn has(&mut self, key: &str) -> bool {
        if self.remove_if_expired(key) {
            return false;
        }
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.total_weight -= entry.weight;
                self.lru.forget(key);
                self.refresh_live_stats();
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry. Counters are retained.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.total_weight = 0;
        self.refresh_live_stats();
    }

    // == Keys ==
    /// Snapshot of the tier's unexpired keys. Expired entries are skipped
    /// but not removed here; reclamation happens on the next mutating touch.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cumulative weight of live entries (0 for unweighted tiers).
    pub fn weight(&self) -> usize {
        self.total_weight
    }

    /// Current statistics with live entry count and weight filled in.
    pub fn stats(&self) -> TierStats {
        let mut stats = self.stats.clone();
        stats.set_live(self.entries.len(), self.total_weight);
        stats
    }

    // == Internal ==
    /// Removes the entry if present and expired. Returns true if removed.
    fn remove_if_expired(&mut self, key: &str) -> bool {
        let expired = self.entries.get(key).is_some_and(|e| e.is_expired());
        if expired {
            if let Some(entry) = self.entries.remove(key) {
                self.total_weight -= entry.weight;
            }
            self.lru.forget(key);
            self.stats.record_expiration();
            self.refresh_live_stats();
        }
        expired
    }

    /// Evicts least-recently-used entries until the tier is within its
    /// entry and weight bounds. The just-written key is the most recent,
    /// so it goes last; a single entry heavier than the whole weight
    /// budget is therefore dropped too, keeping the invariant.
    fn evict_to_capacity(&mut self) {
        while self.over_capacity() {
            let Some(victim) = self.lru.pop_lru() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&victim) {
                self.total_weight -= entry.weight;
                self.stats.record_eviction();
                debug!(key = %victim, "evicted LRU entry");
            }
        }
    }

    fn over_capacity(&self) -> bool {
        if self.entries.len() > self.config.max_entries {
            return true;
        }
        match self.config.max_weight {
            Some(max) => self.total_weight > max,
            None => false,
        }
    }

    fn refresh_live_stats(&mut self) {
        self.stats.set_live(self.entries.len(), self.total_weight);
    }
}
