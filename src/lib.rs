//! tiercache - Multi-tier in-memory caching layer
//!
//! TTL-bounded, LRU-evicting caching for expensive lookups: remote
//! records, embedding vectors, search results, and user preferences.
//! Callers go through the cache-aside, batch, or memoization wrappers,
//! which route into a [`CacheManager`] owning four capacity-bounded tiers.
//! An optional [`WarmingScheduler`] pre-fills tiers off the hot path.
//!
//! The cache is a single-process optimization layer, never a source of
//! truth: entries may vanish at any time (TTL, eviction, invalidation)
//! and callers must always be able to fall through to the backing source.

pub mod aside;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod flight;
pub mod key;
pub mod memo;
pub mod models;
pub mod tasks;

pub use aside::{CacheAside, CacheAsideOptions};
pub use batch::BatchCoordinator;
pub use cache::{CacheManager, CacheStats, Invalidation, Tier, TierStats};
pub use config::{CacheConfig, ExpiryPolicy, TierConfig};
pub use error::{CacheError, Result};
pub use flight::FlightGroup;
pub use memo::Memoizer;
pub use models::CachedSearchResults;
pub use tasks::{WarmingScheduler, WarmingStrategy};
