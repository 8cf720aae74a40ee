mod settings;

pub use settings::{CacheConfig, LoggingConfig, PipelineConfig, RenderConfig, Settings};
