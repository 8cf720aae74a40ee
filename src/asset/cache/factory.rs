//! Cache backend factory

use std::sync::Arc;

use crate::config::CacheConfig;

use super::backend::AssetCache;
use super::disk_backend::DiskAssetCache;
use super::memory_backend::MemoryAssetCache;

/// Create an asset cache based on configuration.
///
/// Returns the appropriate backend implementation based on the `backend` setting:
/// - `"memory"`: Returns a `MemoryAssetCache`
/// - `"disk"` (default): Returns a `DiskAssetCache` rooted at `directory`, falling
///   back to memory if the directory cannot be opened
///
/// # Example
///
/// ```rust,ignore
/// let cache = create_asset_cache(&settings.cache).await;
/// ```
pub async fn create_asset_cache(settings: &CacheConfig) -> Arc<dyn AssetCache> {
    match settings.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", max_bytes = settings.max_size_bytes, "Creating memory asset cache");
            Arc::new(MemoryAssetCache::new(settings.max_size_bytes))
        }
        other => {
            if other != "disk" {
                tracing::warn!(backend = %other, "Unknown cache backend, using disk");
            }
            match DiskAssetCache::open(&settings.directory, settings.max_size_bytes).await {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Disk asset cache unavailable, falling back to memory"
                    );
                    Arc::new(MemoryAssetCache::new(settings.max_size_bytes))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend() {
        let settings = CacheConfig {
            backend: "memory".to_string(),
            max_size_bytes: 64,
            ..CacheConfig::default()
        };
        let cache = create_asset_cache(&settings).await;
        assert_eq!(cache.stats().max_bytes, 64);
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_disk_backend_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CacheConfig {
            directory: dir.path().join("icons"),
            ..CacheConfig::default()
        };
        let _cache = create_asset_cache(&settings).await;
        assert!(dir.path().join("icons").is_dir());
    }

    #[tokio::test]
    async fn test_unusable_directory_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let settings = CacheConfig {
            directory: file,
            max_size_bytes: 32,
            ..CacheConfig::default()
        };
        let cache = create_asset_cache(&settings).await;
        assert_eq!(cache.stats().max_bytes, 32);
    }
}
