//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (submissions and terminal results by media kind)
//! - Frame pipeline (frames annotated, per-frame inference latency)
//! - Transcoder (final encode duration)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs finished total by media kind and result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidmark_jobs_total", "Total jobs by media kind and result"),
        &["kind", "result"], // kind: "video", "image"; result: "completed", "failed"
    )
    .unwrap()
});

/// Submissions rejected because a job was already running.
pub static JOBS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidmark_jobs_rejected_total",
        "Total submissions rejected while busy",
    )
    .unwrap()
});

/// End-to-end job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("vidmark_job_duration_seconds", "Duration of whole jobs")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Frame pipeline
// =============================================================================

/// Frames run through the annotator.
pub static FRAMES_ANNOTATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidmark_frames_annotated_total",
        "Total frames annotated",
    )
    .unwrap()
});

/// Annotator latency per frame in seconds.
pub static INFERENCE_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "vidmark_inference_latency_seconds",
            "Annotator latency per frame",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
    )
    .unwrap()
});

// =============================================================================
// Transcoder
// =============================================================================

/// Final encode duration in seconds.
pub static TRANSCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("vidmark_transcode_duration_seconds", "Duration of final encodes")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOBS_REJECTED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Frame pipeline
        Box::new(FRAMES_ANNOTATED.clone()),
        Box::new(INFERENCE_LATENCY.clone()),
        // Transcoder
        Box::new(TRANSCODE_DURATION.clone()),
    ]
}
