//! Source-document cache for icons.
//!
//! # Backend Architecture
//!
//! - `DiskAssetCache`: one file per entry, survives restarts (default)
//! - `MemoryAssetCache`: process-local storage using DashMap
//!
//! Both share the same least-recently-used size accounting. Use
//! `create_asset_cache()` to build the backend selected in configuration.

mod backend;
mod disk_backend;
mod factory;
mod lru;
mod memory_backend;

pub use backend::{AssetCache, CacheError, CacheKey, CacheStats};
pub use disk_backend::DiskAssetCache;
pub use factory::create_asset_cache;
pub use memory_backend::MemoryAssetCache;
