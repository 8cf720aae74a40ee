// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain
pub mod asset;
pub mod notification;
pub mod template;

// Presentation
pub mod render;

// Supporting modules
pub mod tasks;
