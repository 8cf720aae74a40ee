//! Asset cache backend trait and shared types

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Cache address of a source document: hex SHA-256 of the normalised URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a resolved URI. Pure function of the URI.
    pub fn for_uri(uri: &Url) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(uri.as_str().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Accept a previously derived key (e.g. a cache file name)
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == 64
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error types for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub entries: usize,
    /// Total bytes stored
    pub total_bytes: u64,
    /// Configured size budget
    pub max_bytes: u64,
}

/// Source-document store shared by every in-flight icon load.
///
/// Implementations must be safe under concurrent `get`/`put` for the same key.
/// Absence is a normal outcome; callers treat errors as misses.
#[async_trait]
pub trait AssetCache: Send + Sync {
    /// Stored bytes for `key`, if any. Never touches the network.
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `bytes` under `key`, replacing any previous entry.
    async fn put(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<(), CacheError>;

    /// Evict least recently accessed entries until the size budget is met.
    ///
    /// Returns the number of entries removed.
    async fn evict_if_over_budget(&self) -> Result<usize, CacheError>;

    /// Get cache statistics
    fn stats(&self) -> CacheStats;
}
