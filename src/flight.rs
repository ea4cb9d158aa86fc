//! In-Flight Request Coalescing
//!
//! Composite cache operations (check, suspend while fetching, write back)
//! are not atomic across their suspension point: concurrent callers missing
//! on the same key would each fetch redundantly. `FlightGroup` serializes
//! those composites per key, so the first caller fills the cache and the
//! rest wait and then observe the hit.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

// == Flight Group ==
/// Per-key gates for coalescing concurrent check-fetch-fill operations.
///
/// The gate map entry is pruned once the last holder leaves, so a failed
/// fill does not pin the key: the next caller starts a fresh attempt.
#[derive(Debug, Default)]
pub struct FlightGroup {
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FlightGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` while holding the gate for `key`.
    ///
    /// Callers racing on the same key run `op` one at a time; `op` is
    /// expected to re-check the cache before fetching, so followers of a
    /// successful fill see a hit and return without fetching.
    pub async fn with_key<T, F, Fut>(&self, key: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let gate = {
            let mut gates = self.gates.lock().await;
            Arc::clone(gates.entry(key.to_string()).or_default())
        };

        let result = {
            let _permit = gate.lock().await;
            op().await
        };

        // Prune the gate once no other caller holds it (map + us = 2)
        let mut gates = self.gates.lock().await;
        if let Some(current) = gates.get(key) {
            if Arc::strong_count(current) <= 2 {
                gates.remove(key);
            }
        }

        result
    }

    /// Number of keys with a live gate. Exposed for tests.
    pub async fn in_flight(&self) -> usize {
        self.gates.lock().await.len()
    }
}
