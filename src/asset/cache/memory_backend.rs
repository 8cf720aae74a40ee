//! In-memory asset cache backend using DashMap.
//!
//! Entries are lost on restart; useful for tests and ephemeral runs.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::metrics::CacheMetrics;

use super::backend::{AssetCache, CacheError, CacheKey, CacheStats};
use super::lru::LruIndex;

/// In-memory asset cache backend
pub struct MemoryAssetCache {
    data: DashMap<CacheKey, Vec<u8>>,
    index: LruIndex,
}

impl MemoryAssetCache {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            data: DashMap::new(),
            index: LruIndex::new(max_bytes),
        }
    }
}

#[async_trait]
impl AssetCache for MemoryAssetCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let bytes = self.data.get(key).map(|entry| entry.value().clone());
        if bytes.is_some() {
            self.index.touch(key);
        }
        Ok(bytes)
    }

    async fn put(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<(), CacheError> {
        let size = bytes.len() as u64;
        // Hold the data shard lock while indexing so eviction sees both or neither
        let entry = self.data.entry(key.clone());
        self.index.insert(key.clone(), size);
        entry.insert(bytes);
        CacheMetrics::record_write();
        CacheMetrics::set_bytes(self.index.total_bytes());
        Ok(())
    }

    async fn evict_if_over_budget(&self) -> Result<usize, CacheError> {
        let candidates = self.index.eviction_candidates();
        let mut evicted = 0;
        for key in candidates {
            // Same lock order as `put`: data shard first
            if let Entry::Occupied(entry) = self.data.entry(key.clone()) {
                if self.index.remove(&key).is_some() {
                    entry.remove();
                    evicted += 1;
                }
            }
        }

        if evicted > 0 {
            CacheMetrics::record_evicted(evicted as u64);
            CacheMetrics::set_bytes(self.index.total_bytes());
            tracing::debug!(
                evicted,
                total_bytes = self.index.total_bytes(),
                "Evicted memory cache entries"
            );
        }
        Ok(evicted)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.index.len(),
            total_bytes: self.index.total_bytes(),
            max_bytes: self.index.max_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::for_uri(&Url::parse(&format!("https://cloud.example.com/{}", path)).unwrap())
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MemoryAssetCache::new(1024);
        cache.put(&key("a.svg"), b"<svg/>".to_vec()).await.unwrap();

        assert_eq!(cache.get(&key("a.svg")).await.unwrap(), Some(b"<svg/>".to_vec()));
        assert_eq!(cache.get(&key("b.svg")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = MemoryAssetCache::new(1024);
        cache.put(&key("a.svg"), vec![1; 10]).await.unwrap();
        cache.put(&key("a.svg"), vec![2; 4]).await.unwrap();

        assert_eq!(cache.get(&key("a.svg")).await.unwrap(), Some(vec![2; 4]));
        assert_eq!(cache.stats().total_bytes, 4);
        assert_eq!(cache.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = MemoryAssetCache::new(20);
        cache.put(&key("a.svg"), vec![0; 10]).await.unwrap();
        cache.put(&key("b.svg"), vec![0; 10]).await.unwrap();
        cache.get(&key("a.svg")).await.unwrap();
        cache.put(&key("c.svg"), vec![0; 10]).await.unwrap();

        assert_eq!(cache.evict_if_over_budget().await.unwrap(), 1);
        assert!(cache.get(&key("b.svg")).await.unwrap().is_none());
        assert!(cache.get(&key("a.svg")).await.unwrap().is_some());
        assert!(cache.get(&key("c.svg")).await.unwrap().is_some());
        assert_eq!(cache.stats().total_bytes, 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_and_evict_keep_index_consistent() {
        let cache = std::sync::Arc::new(MemoryAssetCache::new(64));

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    for round in 0..200 {
                        let size = 1 + (writer + round) % 16;
                        cache.put(&key(&format!("{}.svg", round % 8)), vec![0; size]).await.unwrap();
                    }
                })
            })
            .collect();
        let evictor = {
            let cache = cache.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    cache.evict_if_over_budget().await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for writer in writers {
            writer.await.unwrap();
        }
        evictor.await.unwrap();

        let stored: u64 = cache.data.iter().map(|entry| entry.value().len() as u64).sum();
        assert_eq!(cache.stats().entries, cache.data.len());
        assert_eq!(cache.stats().total_bytes, stored);
    }
}
