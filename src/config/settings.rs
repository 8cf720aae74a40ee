use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::template::{Color, NameScan};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache backend: "disk" (default) or "memory"
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    /// Directory holding cached source documents
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
    /// Size budget in bytes; least recently used entries are evicted beyond it
    #[serde(default = "default_cache_max_size")]
    pub max_size_bytes: u64,
    /// Background eviction interval in seconds
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

fn default_cache_backend() -> String {
    "disk".to_string()
}

fn default_cache_dir() -> PathBuf {
    env::temp_dir().join("ara-notification-icons")
}

fn default_cache_max_size() -> u64 {
    16 * 1024 * 1024 // 16 MiB
}

fn default_eviction_interval() -> u64 {
    300 // 5 minutes
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Raster width in pixels
    #[serde(default = "default_raster_size")]
    pub raster_width: u32,
    /// Raster height in pixels
    #[serde(default = "default_raster_size")]
    pub raster_height: u32,
    /// Image shown while an icon is loading
    #[serde(default = "default_icon_image")]
    pub placeholder_image: String,
    /// Image shown when an icon cannot be loaded
    #[serde(default = "default_icon_image")]
    pub error_image: String,
    /// Largest icon document accepted from the network
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: usize,
    /// Transport timeout for icon requests, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_raster_size() -> u32 {
    48
}

fn default_icon_image() -> String {
    "ic_notification".to_string()
}

fn default_max_fetch_bytes() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_http_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("ara-notification-renderer/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Colour of substituted rich object names
    #[serde(default)]
    pub emphasis_color: Color,
    /// Opacity applied to the message body (0.0 - 1.0)
    #[serde(default = "default_message_opacity")]
    pub message_opacity: f32,
    /// Glyph appended to linked subjects
    #[serde(default = "default_link_arrow")]
    pub link_arrow: String,
    /// Whether braces inside substituted names are scanned again
    #[serde(default)]
    pub name_scan: NameScan,
}

fn default_message_opacity() -> f32 {
    0.57
}

fn default_link_arrow() -> String {
    "↗".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("cache.backend", default_cache_backend())?
            .set_default("cache.max_size_bytes", default_cache_max_size() as i64)?
            .set_default("cache.eviction_interval_secs", default_eviction_interval() as i64)?
            .set_default("pipeline.raster_width", default_raster_size() as i64)?
            .set_default("pipeline.raster_height", default_raster_size() as i64)?
            .set_default("render.message_opacity", default_message_opacity() as f64)?
            .set_default("logging.level", default_log_level())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // NOTIFY__CACHE__DIRECTORY, NOTIFY__PIPELINE__RASTER_WIDTH, etc.
            .add_source(
                Environment::with_prefix("NOTIFY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.raster_width == 0 || self.pipeline.raster_height == 0 {
            return Err(ConfigError::Message(
                "pipeline raster dimensions must be non-zero".to_string(),
            ));
        }
        if self.cache.eviction_interval_secs == 0 {
            return Err(ConfigError::Message(
                "cache.eviction_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.pipeline.http_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "pipeline.http_timeout_secs must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.render.message_opacity) {
            return Err(ConfigError::Message(
                "render.message_opacity must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            directory: default_cache_dir(),
            max_size_bytes: default_cache_max_size(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raster_width: default_raster_size(),
            raster_height: default_raster_size(),
            placeholder_image: default_icon_image(),
            error_image: default_icon_image(),
            max_fetch_bytes: default_max_fetch_bytes(),
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            emphasis_color: Color::BLACK,
            message_opacity: default_message_opacity(),
            link_arrow: default_link_arrow(),
            name_scan: NameScan::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.cache.backend, "disk");
        assert_eq!(settings.cache.max_size_bytes, 16 * 1024 * 1024);
        assert_eq!(settings.pipeline.raster_width, 48);
        assert_eq!(settings.pipeline.placeholder_image, "ic_notification");
        assert_eq!(settings.render.emphasis_color, Color::BLACK);
        assert_eq!(settings.render.link_arrow, "↗");
        assert_eq!(settings.render.name_scan, NameScan::Skip);
        assert!((settings.render.message_opacity - 0.57).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_zero_raster() {
        let mut settings = Settings::default();
        settings.pipeline.raster_height = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_eviction_interval() {
        let mut settings = Settings::default();
        settings.cache.eviction_interval_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_http_timeout() {
        let mut settings = Settings::default();
        settings.pipeline.http_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_opacity_out_of_range() {
        let mut settings = Settings::default();
        settings.render.message_opacity = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let settings: Settings = Config::builder()
            .set_override("render.emphasis_color", "#336699")
            .unwrap()
            .set_override("render.name_scan", "rescan")
            .unwrap()
            .set_override("cache.backend", "memory")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.render.emphasis_color, Color::rgb(0x33, 0x66, 0x99));
        assert_eq!(settings.render.name_scan, NameScan::Rescan);
        assert_eq!(settings.cache.backend, "memory");
        assert_eq!(settings.pipeline.raster_height, 48);
    }
}
