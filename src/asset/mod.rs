//! Icon loading: fetch, decode, rasterize and cache remote vector icons.

pub mod cache;
mod decoder;
mod fetcher;
mod pipeline;
mod types;

pub use cache::{
    create_asset_cache, AssetCache, CacheError, CacheKey, CacheStats, DiskAssetCache,
    MemoryAssetCache,
};
pub use decoder::VectorDocument;
pub use fetcher::{resolve_uri, AssetFetcher, HttpFetcher};
pub use pipeline::{AssetPipeline, Deliveries, Delivery, LoadHandle};
pub use types::{
    AssetError, AssetRequestConfig, CacheStrategy, IconState, IconTarget, LayerType, LoadState,
    PipelineResult, RasterImage, SourceFormat, StaticImage, TargetId,
};
