//! Cache Warming Task
//!
//! Background task that periodically pre-populates cache tiers through
//! pluggable strategies, keeping expensive lookups off the hot path. The
//! strategies use the same set/get surface as normal callers; there is no
//! special batching.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheManager;

// == Warming Strategy ==
/// A pluggable pre-fill strategy (e.g. popular boards, recent searches).
///
/// Strategies run off the critical path; an error aborts only the current
/// run of that strategy, never the scheduler.
#[async_trait]
pub trait WarmingStrategy: Send + Sync {
    /// Strategy name, used in logs.
    fn name(&self) -> &str;

    /// Pre-populates tiers through the normal cache surface.
    async fn warm(&self, cache: &CacheManager) -> anyhow::Result<()>;
}

// == Warming Scheduler ==
/// Repeating timer driving the registered warming strategies.
///
/// Constructed and injected explicitly alongside the cache manager;
/// typically one instance per process, started only in production-like
/// environments. Stops its background task when dropped.
pub struct WarmingScheduler {
    cache: Arc<CacheManager>,
    strategies: Vec<Arc<dyn WarmingStrategy>>,
    handle: Option<JoinHandle<()>>,
}

impl WarmingScheduler {
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self {
            cache,
            strategies: Vec::new(),
            handle: None,
        }
    }

    /// Registers a strategy. Strategies run sequentially, in registration
    /// order, on every tick.
    pub fn add_strategy(&mut self, strategy: Arc<dyn WarmingStrategy>) {
        self.strategies.push(strategy);
    }

    // == Start ==
    /// Starts the repeating warming task. Calling `start` while already
    /// running is a no-op.
    pub fn start(&mut self, interval: Duration) {
        if self.handle.is_some() {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let strategies = self.strategies.clone();

        info!(
            interval_secs = interval.as_secs(),
            strategies = strategies.len(),
            "starting cache warming task"
        );

        self.handle = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                for strategy in &strategies {
                    match strategy.warm(&cache).await {
                        Ok(()) => debug!(strategy = strategy.name(), "warming run complete"),
                        Err(e) => {
                            warn!(strategy = strategy.name(), error = %e, "warming run failed")
                        }
                    }
                }
            }
        }));
    }

    // == Stop ==
    /// Cancels the warming task. Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("cache warming task stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for WarmingScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
