//! Prometheus metrics for the notification renderer.
//!
//! This module provides metrics for monitoring icon loading:
//! - Cache metrics (hits, misses, writes, evictions, stored bytes)
//! - Pipeline metrics (loads started, results by outcome, cancellations)
//! - Latency metrics (network fetch, decode + rasterize)

mod helpers;

pub use helpers::{encode_metrics, CacheMetrics, PipelineMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_renderer";

lazy_static! {
    // ============================================================================
    // Cache Metrics
    // ============================================================================

    /// Cache lookups that found the source document
    pub static ref CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_cache_hits_total", METRIC_PREFIX),
        "Total icon cache hits"
    ).unwrap();

    /// Cache lookups that require a fetch
    pub static ref CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_cache_misses_total", METRIC_PREFIX),
        "Total icon cache misses"
    ).unwrap();

    /// Source documents written to the cache
    pub static ref CACHE_WRITES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_cache_writes_total", METRIC_PREFIX),
        "Total icon cache writes"
    ).unwrap();

    /// Entries reclaimed by size-based eviction
    pub static ref CACHE_EVICTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_cache_evictions_total", METRIC_PREFIX),
        "Total icon cache entries evicted"
    ).unwrap();

    /// Cache I/O errors (treated as misses)
    pub static ref CACHE_IO_ERRORS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_cache_io_errors_total", METRIC_PREFIX),
        "Total icon cache I/O errors"
    ).unwrap();

    /// Bytes currently held by the cache
    pub static ref CACHE_BYTES: IntGauge = register_int_gauge!(
        format!("{}_cache_bytes", METRIC_PREFIX),
        "Total bytes stored in the icon cache"
    ).unwrap();

    // ============================================================================
    // Pipeline Metrics
    // ============================================================================

    /// Icon loads started
    pub static ref PIPELINE_LOADS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_pipeline_loads_total", METRIC_PREFIX),
        "Total icon loads started"
    ).unwrap();

    /// Icon load results by outcome (success, fallback)
    pub static ref PIPELINE_RESULTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_pipeline_results_total", METRIC_PREFIX),
        "Total icon load results delivered",
        &["outcome"]
    ).unwrap();

    /// Icon load failures by stage
    pub static ref PIPELINE_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_pipeline_failures_total", METRIC_PREFIX),
        "Total icon load failures",
        &["stage"]
    ).unwrap();

    /// Icon loads cancelled before delivery
    pub static ref PIPELINE_CANCELLED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_pipeline_cancelled_total", METRIC_PREFIX),
        "Total icon loads cancelled"
    ).unwrap();

    /// Network fetch latency
    pub static ref FETCH_LATENCY: Histogram = register_histogram!(
        format!("{}_fetch_latency_seconds", METRIC_PREFIX),
        "Icon fetch latency in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();

    /// Decode plus rasterize latency
    pub static ref RENDER_LATENCY: Histogram = register_histogram!(
        format!("{}_render_latency_seconds", METRIC_PREFIX),
        "Icon decode and rasterize latency in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        // Initialize some metrics first (lazy_static requires first access)
        CACHE_BYTES.set(1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("ara_renderer_cache_bytes"));
    }

    #[test]
    fn test_pipeline_metrics() {
        PIPELINE_LOADS_TOTAL.inc();
        PIPELINE_RESULTS_TOTAL.with_label_values(&["success"]).inc();
        PIPELINE_FAILURES_TOTAL.with_label_values(&["decode"]).inc();
        PIPELINE_CANCELLED_TOTAL.inc();
        FETCH_LATENCY.observe(0.1);
        RENDER_LATENCY.observe(0.01);
        // Just verify no panics
    }
}
