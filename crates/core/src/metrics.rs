//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Transforms (outcomes, durations)
//! - Health probe (runs, durations, readiness)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Transform Metrics
// =============================================================================

/// Transforms total by transform name and outcome.
pub static TRANSFORMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tengine_transforms_total", "Total transforms executed"),
        &["transform", "outcome"], // "success", "client_error", "server_error"
    )
    .unwrap()
});

/// Transform duration in seconds.
pub static TRANSFORM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tengine_transform_duration_seconds",
            "Duration of transforms including process execution",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Commands killed for exceeding their timeout.
pub static TRANSFORM_TIMEOUTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tengine_transform_timeouts_total",
            "Total transform commands killed after timing out",
        ),
        &["transform"],
    )
    .unwrap()
});

// =============================================================================
// Probe Metrics
// =============================================================================

/// Probe runs total by result.
pub static PROBE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tengine_probe_runs_total", "Total health probe runs"),
        &["result"], // "passed", "failed"
    )
    .unwrap()
});

/// Probe duration in seconds.
pub static PROBE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tengine_probe_duration_seconds",
            "Duration of health probe transforms",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Readiness (1 = ready, 0 = not ready).
pub static PROBE_READY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tengine_ready",
        "Whether the health probe reports the engine ready (1) or not (0)",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Transforms
        Box::new(TRANSFORMS_TOTAL.clone()),
        Box::new(TRANSFORM_DURATION.clone()),
        Box::new(TRANSFORM_TIMEOUTS.clone()),
        // Probe
        Box::new(PROBE_RUNS.clone()),
        Box::new(PROBE_DURATION.clone()),
        Box::new(PROBE_READY.clone()),
    ]
}
