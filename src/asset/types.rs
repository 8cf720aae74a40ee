//! Icon pipeline types and error definitions

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::PipelineConfig;

/// Pipeline-specific error type.
///
/// Every variant collapses to the error image; none reaches the rendering caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("Invalid icon URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    #[error("Failed to decode vector document {uri}: {reason}")]
    Decode { uri: String, reason: String },

    #[error("Failed to rasterize {uri}: {reason}")]
    Rasterize { uri: String, reason: String },
}

impl AssetError {
    /// Pipeline stage the error originated from, used as a metric label
    pub fn stage(&self) -> &'static str {
        match self {
            AssetError::InvalidUri { .. } => "resolve",
            AssetError::Fetch { .. } => "fetch",
            AssetError::Decode { .. } => "decode",
            AssetError::Rasterize { .. } => "rasterize",
        }
    }
}

/// A bundled image referenced by resource name (placeholder, error glyph)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StaticImage(pub String);

impl StaticImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// How a raster must be composited by the display target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Composite on a software layer; vector-derived rasters are never GPU-backed
    Software,
    /// No constraint, the target may use hardware composition
    Hardware,
}

/// Rasterized icon: premultiplied RGBA8 pixels, row-major
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub layer: LayerType,
}

impl RasterImage {
    /// Premultiplied RGBA value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        self.pixels
            .get(offset..offset + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("layer", &self.layer)
            .finish()
    }
}

/// Outcome of an icon load. Never both.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    Success(Arc<RasterImage>),
    Fallback(StaticImage),
}

/// What a display target currently shows for its icon
#[derive(Debug, Clone, PartialEq)]
pub enum IconState {
    /// Load in progress (or never started); the placeholder is shown
    Pending(StaticImage),
    Success(Arc<RasterImage>),
    Fallback(StaticImage),
}

impl IconState {
    pub fn is_pending(&self) -> bool {
        matches!(self, IconState::Pending(_))
    }
}

impl From<PipelineResult> for IconState {
    fn from(result: PipelineResult) -> Self {
        match result {
            PipelineResult::Success(raster) => IconState::Success(raster),
            PipelineResult::Fallback(image) => IconState::Fallback(image),
        }
    }
}

/// Source document format accepted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Svg,
}

/// What the pipeline writes to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Only the original fetched bytes; decoded forms are recomputed
    #[default]
    SourceBytes,
}

/// Request configuration shared by every load of a pipeline
#[derive(Debug, Clone)]
pub struct AssetRequestConfig {
    pub source_format: SourceFormat,
    pub placeholder_image: StaticImage,
    pub error_image: StaticImage,
    pub raster_width: u32,
    pub raster_height: u32,
    pub cache_strategy: CacheStrategy,
}

impl AssetRequestConfig {
    pub fn from_settings(settings: &PipelineConfig) -> Self {
        Self {
            source_format: SourceFormat::Svg,
            placeholder_image: StaticImage::new(settings.placeholder_image.clone()),
            error_image: StaticImage::new(settings.error_image.clone()),
            raster_width: settings.raster_width,
            raster_height: settings.raster_height,
            cache_strategy: CacheStrategy::SourceBytes,
        }
    }
}

impl Default for AssetRequestConfig {
    fn default() -> Self {
        Self::from_settings(&PipelineConfig::default())
    }
}

/// Identifies a display target (one list row's icon view)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target-{}", self.0)
    }
}

/// Load request states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadState {
    /// Accepted, placeholder shown, cache lookup pending
    Pending = 0,
    Fetching = 1,
    Decoding = 2,
    Rasterizing = 3,
    /// A stage failed; the error image is about to be delivered
    Failed = 4,
    /// Result handed to the delivery channel
    Delivering = 5,
    /// Result applied to the target
    Delivered = 6,
    Cancelled = 7,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Delivered | LoadState::Cancelled)
    }
}

impl From<u8> for LoadState {
    fn from(value: u8) -> Self {
        match value {
            0 => LoadState::Pending,
            1 => LoadState::Fetching,
            2 => LoadState::Decoding,
            3 => LoadState::Rasterizing,
            4 => LoadState::Failed,
            5 => LoadState::Delivering,
            6 => LoadState::Delivered,
            _ => LoadState::Cancelled,
        }
    }
}

/// Receives icon state changes. Implemented by the display target.
pub trait IconTarget {
    fn target_id(&self) -> TargetId;

    fn set_icon(&mut self, state: IconState);
}
