//! Size accounting and recency ordering shared by the cache backends

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::backend::CacheKey;

#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    size: u64,
    /// Logical access clock; larger is more recent
    last_access: u64,
}

/// Concurrent index of cached entries with a byte budget
pub(crate) struct LruIndex {
    entries: DashMap<CacheKey, EntryMeta>,
    clock: AtomicU64,
    total_bytes: AtomicU64,
    max_bytes: u64,
}

impl LruIndex {
    pub(crate) fn new(max_bytes: u64) -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            max_bytes,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Mark `key` as just accessed. Returns false if it is not indexed.
    pub(crate) fn touch(&self, key: &CacheKey) -> bool {
        match self.entries.get_mut(key) {
            Some(mut meta) => {
                meta.last_access = self.tick();
                true
            }
            None => false,
        }
    }

    /// Index `key` as the most recently accessed entry
    pub(crate) fn insert(&self, key: CacheKey, size: u64) {
        let meta = EntryMeta {
            size,
            last_access: self.tick(),
        };
        self.total_bytes.fetch_add(size, Ordering::AcqRel);
        if let Some(previous) = self.entries.insert(key, meta) {
            self.total_bytes.fetch_sub(previous.size, Ordering::AcqRel);
        }
    }

    /// Drop `key` from the index, returning its size
    pub(crate) fn remove(&self, key: &CacheKey) -> Option<u64> {
        let (_, meta) = self.entries.remove(key)?;
        self.total_bytes.fetch_sub(meta.size, Ordering::AcqRel);
        Some(meta.size)
    }

    pub(crate) fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Acquire)
    }

    pub(crate) fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Least recently accessed keys whose removal brings the total within budget
    pub(crate) fn eviction_candidates(&self) -> Vec<CacheKey> {
        let mut total = self.total_bytes();
        if total <= self.max_bytes {
            return Vec::new();
        }

        let mut entries: Vec<(CacheKey, EntryMeta)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by_key(|(_, meta)| meta.last_access);

        let mut candidates = Vec::new();
        for (key, meta) in entries {
            if total <= self.max_bytes {
                break;
            }
            total = total.saturating_sub(meta.size);
            candidates.push(key);
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> CacheKey {
        CacheKey::parse(&format!("{:064x}", n)).unwrap()
    }

    #[test]
    fn test_insert_replaces_size() {
        let index = LruIndex::new(100);
        index.insert(key(1), 40);
        index.insert(key(1), 10);
        assert_eq!(index.len(), 1);
        assert_eq!(index.total_bytes(), 10);
    }

    #[test]
    fn test_no_candidates_within_budget() {
        let index = LruIndex::new(100);
        index.insert(key(1), 60);
        index.insert(key(2), 40);
        assert!(index.eviction_candidates().is_empty());
    }

    #[test]
    fn test_candidates_are_least_recently_accessed() {
        let index = LruIndex::new(100);
        index.insert(key(1), 50);
        index.insert(key(2), 50);
        index.insert(key(3), 50);
        assert!(index.touch(&key(1)));

        // 150 bytes against a budget of 100: only the oldest (key 2) must go
        assert_eq!(index.eviction_candidates(), vec![key(2)]);
    }

    #[test]
    fn test_remove_updates_total() {
        let index = LruIndex::new(100);
        index.insert(key(1), 70);
        assert_eq!(index.remove(&key(1)), Some(70));
        assert_eq!(index.remove(&key(1)), None);
        assert_eq!(index.total_bytes(), 0);
        assert!(!index.touch(&key(1)));
    }
}
