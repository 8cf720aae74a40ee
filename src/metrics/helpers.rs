//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    CACHE_BYTES, CACHE_EVICTIONS_TOTAL, CACHE_HITS_TOTAL, CACHE_IO_ERRORS_TOTAL,
    CACHE_MISSES_TOTAL, CACHE_WRITES_TOTAL, FETCH_LATENCY, PIPELINE_CANCELLED_TOTAL,
    PIPELINE_FAILURES_TOTAL, PIPELINE_LOADS_TOTAL, PIPELINE_RESULTS_TOTAL, RENDER_LATENCY,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording cache metrics
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit() {
        CACHE_HITS_TOTAL.inc();
    }

    pub fn record_miss() {
        CACHE_MISSES_TOTAL.inc();
    }

    pub fn record_write() {
        CACHE_WRITES_TOTAL.inc();
    }

    pub fn record_evicted(count: u64) {
        CACHE_EVICTIONS_TOTAL.inc_by(count);
    }

    pub fn record_io_error() {
        CACHE_IO_ERRORS_TOTAL.inc();
    }

    /// Set the total bytes currently stored
    pub fn set_bytes(bytes: u64) {
        CACHE_BYTES.set(i64::try_from(bytes).unwrap_or(i64::MAX));
    }
}

/// Helper struct for recording pipeline metrics
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_load() {
        PIPELINE_LOADS_TOTAL.inc();
    }

    pub fn record_success() {
        PIPELINE_RESULTS_TOTAL.with_label_values(&["success"]).inc();
    }

    /// Record a fallback delivery caused by a failure in `stage`
    pub fn record_fallback(stage: &str) {
        PIPELINE_RESULTS_TOTAL.with_label_values(&["fallback"]).inc();
        PIPELINE_FAILURES_TOTAL.with_label_values(&[stage]).inc();
    }

    pub fn record_cancelled() {
        PIPELINE_CANCELLED_TOTAL.inc();
    }

    pub fn record_fetch_latency(elapsed: Duration) {
        FETCH_LATENCY.observe(elapsed.as_secs_f64());
    }

    pub fn record_render_latency(elapsed: Duration) {
        RENDER_LATENCY.observe(elapsed.as_secs_f64());
    }
}
