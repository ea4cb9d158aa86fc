//! Configuration Module
//!
//! Per-tier cache configuration with sensible defaults and optional
//! environment variable overrides. Configuration is supplied at
//! construction time and is not reloadable.

use std::env;
use std::time::Duration;

// == Expiry Policy ==
/// Controls whether a read refreshes an entry's recency and TTL window.
///
/// - `Sliding`: a read moves the entry to most-recently-used and re-arms
///   its TTL window.
/// - `Fixed`: only writes refresh recency; the TTL window set at write
///   time is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Sliding,
    Fixed,
}

// == Tier Config ==
/// Capacity and expiry settings for a single cache tier.
#[derive(Debug, Clone)]
pub struct TierConfig {
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Maximum cumulative weight, for tiers with a weigher (None = untracked)
    pub max_weight: Option<usize>,
    /// Default TTL applied to entries written without an explicit TTL
    pub ttl: Duration,
    /// Whether reads refresh recency and the TTL window
    pub expiry: ExpiryPolicy,
}

impl TierConfig {
    /// Creates a tier config with no weight bound.
    pub fn new(max_entries: usize, ttl: Duration, expiry: ExpiryPolicy) -> Self {
        Self {
            max_entries,
            max_weight: None,
            ttl,
            expiry,
        }
    }

    /// Adds a cumulative weight bound to the tier.
    pub fn with_max_weight(mut self, max_weight: usize) -> Self {
        self.max_weight = Some(max_weight);
        self
    }
}

// == Cache Config ==
/// Configuration for all four cache tiers.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// General-purpose tier: remote records, ad-hoc values
    pub general: TierConfig,
    /// Embedding vectors, weighted by vector length
    pub embeddings: TierConfig,
    /// Search result payloads
    pub search_results: TierConfig,
    /// Per-user preference/context payloads
    pub preferences: TierConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            general: TierConfig::new(1000, Duration::from_secs(5 * 60), ExpiryPolicy::Sliding),
            embeddings: TierConfig::new(1000, Duration::from_secs(60 * 60), ExpiryPolicy::Fixed)
                // roughly 2048 vectors of 768 floats
                .with_max_weight(2048 * 768),
            search_results: TierConfig::new(
                500,
                Duration::from_secs(10 * 60),
                ExpiryPolicy::Sliding,
            ),
            preferences: TierConfig::new(1000, Duration::from_secs(30 * 60), ExpiryPolicy::Sliding),
        }
    }
}

impl CacheConfig {
    /// Creates a CacheConfig from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// # Environment Variables
    /// - `CACHE_GENERAL_MAX_ENTRIES` / `CACHE_GENERAL_TTL_SECS`
    /// - `CACHE_EMBEDDINGS_MAX_ENTRIES` / `CACHE_EMBEDDINGS_TTL_SECS`
    /// - `CACHE_SEARCH_MAX_ENTRIES` / `CACHE_SEARCH_TTL_SECS`
    /// - `CACHE_PREFERENCES_MAX_ENTRIES` / `CACHE_PREFERENCES_TTL_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        apply_env(&mut config.general, "CACHE_GENERAL");
        apply_env(&mut config.embeddings, "CACHE_EMBEDDINGS");
        apply_env(&mut config.search_results, "CACHE_SEARCH");
        apply_env(&mut config.preferences, "CACHE_PREFERENCES");

        config
    }
}

/// Applies `<prefix>_MAX_ENTRIES` and `<prefix>_TTL_SECS` overrides to a tier.
fn apply_env(tier: &mut TierConfig, prefix: &str) {
    if let Some(max_entries) = env_parse(&format!("{}_MAX_ENTRIES", prefix)) {
        tier.max_entries = max_entries;
    }
    if let Some(ttl_secs) = env_parse::<u64>(&format!("{}_TTL_SECS", prefix)) {
        tier.ttl = Duration::from_secs(ttl_secs);
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
