//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the vidmark server:
//! - HTTP request metrics (latency, counts, errors)
//! - Current job status (collected dynamically)
//! - Core engine metrics (jobs, frames, inference latency, transcodes)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

use vidmark_core::JobStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidmark_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidmark_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidmark_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Whether a job is processing (1) or not (0).
pub static JOB_PROCESSING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidmark_job_processing",
        "Whether a job is currently processing (1) or not (0)",
    )
    .unwrap()
});

/// Progress of the current or last job.
pub static JOB_PERCENT_COMPLETE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidmark_job_percent_complete",
        "Progress of the current or most recent job",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Job
    registry
        .register(Box::new(JOB_PROCESSING.clone()))
        .unwrap();
    registry
        .register(Box::new(JOB_PERCENT_COMPLETE.clone()))
        .unwrap();

    // Core metrics (jobs, frame pipeline, transcoder)
    for metric in vidmark_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the job gauges reflect the live job slot.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let snapshot = state.orchestrator().snapshot();
    JOB_PROCESSING.set(if snapshot.status == JobStatus::Processing {
        1
    } else {
        0
    });
    JOB_PERCENT_COMPLETE.set(snapshot.percent_complete as i64);
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static FILE_ROUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(result|download)/[^/]+").unwrap());

/// Normalize a path for metric labels (replace IDs and file names with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_RE.replace_all(path, "{id}");
    let result = FILE_ROUTE_RE.replace_all(&result, "/$1/{filename}");
    result.to_string()
}
