//! On-disk asset cache backend.
//!
//! One file per entry, named after the cache key. Writes go to a uniquely
//! named temporary file that is renamed into place, so readers never observe
//! a partial entry and concurrent writers of the same key cannot interleave.
//! The index is rebuilt from the directory on open, oldest modification first.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::metrics::CacheMetrics;

use super::backend::{AssetCache, CacheError, CacheKey, CacheStats};
use super::lru::LruIndex;

/// Suffix of in-progress writes
const TEMP_SUFFIX: &str = ".tmp";

/// On-disk asset cache backend
pub struct DiskAssetCache {
    directory: PathBuf,
    index: LruIndex,
}

impl DiskAssetCache {
    /// Open (or create) a cache rooted at `directory`.
    ///
    /// Existing entries are indexed; leftovers from interrupted writes are removed.
    pub async fn open(directory: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)
            .await
            .map_err(|e| CacheError::io(&directory, e))?;

        let mut found: Vec<(CacheKey, u64, SystemTime)> = Vec::new();
        let mut dir = fs::read_dir(&directory)
            .await
            .map_err(|e| CacheError::io(&directory, e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&directory, e))?
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if name.ends_with(TEMP_SUFFIX) {
                if let Err(e) = fs::remove_file(&path).await {
                    tracing::debug!(path = %path.display(), error = %e, "Failed to remove stale temp file");
                }
                continue;
            }

            let Some(key) = CacheKey::parse(name) else {
                continue;
            };

            match entry.metadata().await {
                Ok(meta) if meta.is_file() => {
                    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    found.push((key, meta.len(), modified));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable cache entry");
                }
            }
        }

        found.sort_by_key(|(_, _, modified)| *modified);

        let index = LruIndex::new(max_bytes);
        for (key, size, _) in found {
            index.insert(key, size);
        }

        tracing::info!(
            directory = %directory.display(),
            entries = index.len(),
            total_bytes = index.total_bytes(),
            max_bytes,
            "Opened disk asset cache"
        );
        CacheMetrics::set_bytes(index.total_bytes());

        Ok(Self { directory, index })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.as_str())
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.directory
            .join(format!("{}.{}{}", key, Uuid::new_v4().simple(), TEMP_SUFFIX))
    }
}

#[async_trait]
impl AssetCache for DiskAssetCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        if !self.index.contains(key) {
            return Ok(None);
        }

        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                self.index.touch(key);
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Removed behind our back (eviction race or external cleanup)
                self.index.remove(key);
                Ok(None)
            }
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    async fn put(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<(), CacheError> {
        let size = bytes.len() as u64;
        let temp = self.temp_path(key);
        let path = self.entry_path(key);

        if let Err(e) = fs::write(&temp, &bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::io(temp, e));
        }
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::io(path, e));
        }

        self.index.insert(key.clone(), size);
        CacheMetrics::record_write();
        CacheMetrics::set_bytes(self.index.total_bytes());

        tracing::debug!(key = %key, size, "Stored icon source in disk cache");
        Ok(())
    }

    async fn evict_if_over_budget(&self) -> Result<usize, CacheError> {
        let candidates = self.index.eviction_candidates();
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut evicted = 0;
        let mut first_error = None;
        for key in candidates {
            if self.index.remove(&key).is_none() {
                continue;
            }
            let path = self.entry_path(&key);
            match fs::remove_file(&path).await {
                Ok(()) => evicted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => evicted += 1,
                Err(e) => {
                    CacheMetrics::record_io_error();
                    tracing::warn!(path = %path.display(), error = %e, "Failed to evict cache entry");
                    first_error.get_or_insert(CacheError::io(path, e));
                }
            }
        }

        CacheMetrics::record_evicted(evicted as u64);
        CacheMetrics::set_bytes(self.index.total_bytes());
        tracing::info!(
            evicted,
            total_bytes = self.index.total_bytes(),
            max_bytes = self.index.max_bytes(),
            "Evicted disk cache entries"
        );

        match first_error {
            Some(error) if evicted == 0 => Err(error),
            _ => Ok(evicted),
        }
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.index.len(),
            total_bytes: self.index.total_bytes(),
            max_bytes: self.index.max_bytes(),
        }
    }
}
