use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::asset::AssetCache;

/// Shortest interval between eviction rounds
const MIN_EVICTION_INTERVAL: Duration = Duration::from_secs(1);

/// Background task keeping the asset cache within its size budget
pub struct EvictionTask {
    cache: Arc<dyn AssetCache>,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl EvictionTask {
    pub fn new(
        cache: Arc<dyn AssetCache>,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            cache,
            interval: interval.max(MIN_EVICTION_INTERVAL),
            shutdown,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(self.interval);

        // Skip immediate first tick
        timer.tick().await;

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            max_bytes = self.cache.stats().max_bytes,
            "Cache eviction task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Cache eviction task received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    self.evict().await;
                }
            }
        }

        // Leave the cache within budget for the next run
        self.evict().await;
        tracing::info!("Cache eviction task stopped");
    }

    async fn evict(&self) {
        let start = Instant::now();
        match self.cache.evict_if_over_budget().await {
            Ok(0) => {}
            Ok(evicted) => {
                let stats = self.cache.stats();
                tracing::debug!(
                    evicted,
                    entries = stats.entries,
                    total_bytes = stats.total_bytes,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Cache eviction round completed"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache eviction failed");
            }
        }
    }
}
