//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cache entry: the stored value plus expiry metadata and the
/// weight it was admitted with. Owned exclusively by its tier store.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// The TTL window this entry was written with, kept so sliding tiers
    /// can re-arm expiry on read
    pub ttl_ms: Option<u64>,
    /// Weighted size as computed by the tier's weigher (0 if unweighted)
    pub weight: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL and a precomputed weight.
    pub fn new(value: V, ttl: Option<Duration>, weight: usize) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = ttl.map(|d| d.as_millis() as u64);
        let expires_at = ttl_ms.map(|ms| now + ms);

        Self {
            value,
            created_at: now,
            expires_at,
            ttl_ms,
            weight,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Slide ==
    /// Re-arms the expiry window from now. Called on read by sliding tiers.
    pub fn slide(&mut self) {
        if let Some(ttl_ms) = self.ttl_ms {
            self.expires_at = Some(current_timestamp_ms() + ttl_ms);
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            expires.saturating_sub(now)
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
