use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Errors surfaced by the renderer binary.
///
/// Per-entry failures (template misses, icon errors, cache I/O) never reach
/// this type; they degrade to literal text or the fallback image.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid notification list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
