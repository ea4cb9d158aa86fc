//! Cache Statistics Module
//!
//! Tracks per-tier performance metrics: hits, misses, evictions,
//! expirations, and live entry count/weight.

use serde::Serialize;

// == Tier Stats ==
/// Performance metrics for a single tier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TierStats {
    /// Successful retrievals
    pub hits: u64,
    /// Failed retrievals (absent or expired)
    pub misses: u64,
    /// Entries evicted by the LRU policy
    pub evictions: u64,
    /// Entries removed lazily after their TTL elapsed
    pub expirations: u64,
    /// Current number of live entries
    pub entries: usize,
    /// Current cumulative weight (0 for unweighted tiers)
    pub weight: usize,
}

impl TierStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before any retrievals.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    /// Refreshes the live entry count and weight.
    pub fn set_live(&mut self, entries: usize, weight: usize) {
        self.entries = entries;
        self.weight = weight;
    }
}

// == Cache Stats ==
/// Aggregated statistics for all tiers, as reported by the manager.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub general: TierStats,
    pub embeddings: TierStats,
    pub search_results: TierStats,
    pub preferences: TierStats,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = TierStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = TierStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_counters() {
        let mut stats = TierStats::new();
        stats.record_eviction();
        stats.record_eviction();
        stats.record_expiration();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_set_live() {
        let mut stats = TierStats::new();
        stats.set_live(12, 9216);
        assert_eq!(stats.entries, 12);
        assert_eq!(stats.weight, 9216);
    }

    #[test]
    fn test_cache_stats_serializes() {
        let stats = CacheStats {
            general: TierStats::new(),
            embeddings: TierStats::new(),
            search_results: TierStats::new(),
            preferences: TierStats::new(),
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.get("embeddings").is_some());
    }
}
