//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use crate::errors::{AppError, Result};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Metrics prefix for all Canto metrics
pub const METRICS_PREFIX: &str = "canto";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of search queries"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search query latency in seconds"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of sections returned from the last search"
    );

    describe_counter!(
        format!("{}_invalid_patterns_total", METRICS_PREFIX),
        Unit::Count,
        "Total queries rejected because the pattern did not compile"
    );

    // Pattern cache metrics
    describe_counter!(
        format!("{}_pattern_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total compiled-pattern cache hits"
    );

    describe_counter!(
        format!("{}_pattern_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total compiled-pattern cache misses"
    );

    // Corpus metrics
    describe_gauge!(
        format!("{}_corpus_sections", METRICS_PREFIX),
        Unit::Count,
        "Number of sections in each loaded corpus"
    );

    tracing::info!("Metrics registered");
}

/// Install the Prometheus exporter with an HTTP scrape endpoint on `port`
pub fn install_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| AppError::Configuration {
            message: format!("Invalid metric buckets: {}", e),
        })?
        .install()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to install Prometheus exporter: {}", e),
        })?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record search metrics
pub fn record_search(duration_secs: f64, corpus: &str, result_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "corpus" => corpus.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "corpus" => corpus.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        "corpus" => corpus.to_string()
    )
    .set(result_count as f64);
}

/// Helper to record a rejected pattern
pub fn record_invalid_pattern(corpus: &str) {
    counter!(
        format!("{}_invalid_patterns_total", METRICS_PREFIX),
        "corpus" => corpus.to_string()
    )
    .increment(1);
}

/// Helper to record pattern cache metrics
pub fn record_pattern_cache(hit: bool) {
    if hit {
        counter!(format!("{}_pattern_cache_hits_total", METRICS_PREFIX)).increment(1);
    } else {
        counter!(format!("{}_pattern_cache_misses_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record the size of a loaded corpus
pub fn record_corpus(code: &str, sections: usize) {
    gauge!(
        format!("{}_corpus_sections", METRICS_PREFIX),
        "corpus" => code.to_string()
    )
    .set(sections as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // P50 target (50ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.050));
        // P99 target (150ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No global recorder installed; calls must be no-ops
        let metrics = RequestMetrics::start("POST", "/api/search");
        metrics.finish(200);
        record_search(0.01, "MBH", 3);
        record_invalid_pattern("MBH");
        record_pattern_cache(true);
        record_corpus("MBH", 10);
    }
}
