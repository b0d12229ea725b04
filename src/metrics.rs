//! Service metrics with Prometheus
//!
//! Exposes key operational metrics for monitoring and alerting:
//! - Request rates and latencies
//! - Model load outcomes and durations
//! - Per-capability inference outcomes and durations

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bhaav_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Total HTTP requests
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bhaav_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Model construction attempts (exactly one per capability per process)
    pub static ref MODEL_LOAD_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bhaav_model_load_total", "Model construction attempts"),
        &["capability", "result"]
    ).unwrap();

    /// Model construction duration
    pub static ref MODEL_LOAD_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bhaav_model_load_duration_seconds",
            "Model construction duration"
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["capability"]
    ).unwrap();

    /// Per-request inference invocations
    pub static ref INFERENCE_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bhaav_inference_total", "Inference invocations"),
        &["capability", "result"]
    ).unwrap();

    /// Per-request inference duration
    pub static ref INFERENCE_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "bhaav_inference_duration_seconds",
            "Inference invocation duration"
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["capability"]
    ).unwrap();
}

/// Register all metrics with the global registry. Call once at startup.
pub fn register_metrics() -> Result<(), prometheus::Error> {
    METRICS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(MODEL_LOAD_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(MODEL_LOAD_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(INFERENCE_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(INFERENCE_DURATION.clone()))?;
    Ok(())
}
