//! Router Configuration - Centralized route definitions
//!
//! The analysis endpoints plus the always-available infrastructure routes.
//! No authentication layer: this service is a local-network collaborator of
//! its frontends.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::state::ServiceState;
use super::{analyze, health};

/// Application state type alias
pub type AppState = Arc<ServiceState>;

/// Build the complete router.
///
/// Cross-cutting layers (CORS, metrics middleware, concurrency limit) are
/// applied by the caller (main.rs).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // ROOT & HEALTH
        // =================================================================
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        // =================================================================
        // METRICS (PROMETHEUS)
        // =================================================================
        .route("/metrics", get(health::metrics_endpoint))
        // =================================================================
        // ANALYSIS
        // =================================================================
        .route("/analyze/sentiment", post(analyze::analyze_sentiment))
        .route("/analyze/emotion", post(analyze::analyze_emotion))
        .route("/analyze/summary", post(analyze::analyze_summary))
        // =================================================================
        // STATE
        // =================================================================
        .with_state(state)
}
