//! Health and Infrastructure Handlers
//!
//! Root banner, Kubernetes-style probes, and the Prometheus metrics
//! endpoint. The readiness probe is the aggregate view of the model
//! registry: 200 only when every capability is Ready.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::registry::{Capability, ReadinessKind};

use super::router::AppState;

/// Root response - a liveness banner, reachable before any model is loaded.
#[derive(Serialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        message: "Bhaav text-analysis server running".to_string(),
    })
}

/// Per-capability entry in the health report.
#[derive(Serialize)]
pub struct ModelStatus {
    pub capability: &'static str,
    pub state: ReadinessKind,
}

/// Full health report.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub models: Vec<ModelStatus>,
}

/// GET /health - always 200; reports per-model readiness for dashboards.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = Capability::ALL
        .iter()
        .map(|cap| ModelStatus {
            capability: cap.as_str(),
            state: state.registry().readiness_of(*cap),
        })
        .collect();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        models,
    })
}

/// GET /health/live - liveness probe; succeeds whenever the process serves.
pub async fn health_live() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
        })),
    )
}

/// GET /health/ready - readiness probe: 200 once all models are Ready,
/// 503 with the per-model breakdown until then.
///
/// Note this is stricter than the per-endpoint contract - each analysis
/// endpoint serves as soon as its own model is up.
pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let registry = state.registry();

    let models: Vec<serde_json::Value> = Capability::ALL
        .iter()
        .map(|cap| {
            serde_json::json!({
                "capability": cap.as_str(),
                "state": registry.readiness_of(*cap).as_str(),
            })
        })
        .collect();

    let all_ready = registry.all_ready();
    let status = if all_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if all_ready { "ready" } else { "loading" },
            "models": models,
        })),
    )
}

/// GET /metrics - Prometheus metrics endpoint for observability.
pub async fn metrics_endpoint() -> Result<String, StatusCode> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let metric_families = crate::metrics::METRICS_REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
