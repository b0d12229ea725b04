//! Analysis endpoint handlers
//!
//! Each handler follows the same shape: consult the readiness registry,
//! answer 503 if the capability's model is not loaded, otherwise invoke the
//! unit on a blocking worker thread (model calls are CPU-heavy and must not
//! stall the async runtime) and normalize the raw result.
//!
//! Handlers hold no cross-request state; every invocation is independent.

use axum::{extract::State, response::Json};
use std::time::Instant;

use crate::analysis::SummaryParams;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::registry::{Capability, Readiness};

use super::normalize;
use super::router::AppState;
use super::types::{LabeledScore, SummaryResponse, TextRequest};

/// Ranking depth requested from the sentiment unit per invocation.
const SENTIMENT_TOP_K: usize = 3;

/// POST /analyze/sentiment
pub async fn analyze_sentiment(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<Vec<LabeledScore>>> {
    let unit = match state.registry().sentiment() {
        Readiness::Ready(unit) => unit,
        _ => return Err(AppError::ModelNotLoaded(Capability::Sentiment)),
    };

    let raw = invoke(Capability::Sentiment, move || {
        unit.classify(&req.text, Some(SENTIMENT_TOP_K))
    })
    .await?;

    Ok(Json(normalize::normalize_sentiment(raw)))
}

/// POST /analyze/emotion
pub async fn analyze_emotion(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<Vec<LabeledScore>>> {
    let unit = match state.registry().emotion() {
        Readiness::Ready(unit) => unit,
        _ => return Err(AppError::ModelNotLoaded(Capability::Emotion)),
    };

    // Ranking depth (top-5) is configured into the unit at construction time
    let raw = invoke(Capability::Emotion, move || unit.classify(&req.text, None)).await?;

    Ok(Json(normalize::normalize_emotion(raw)))
}

/// POST /analyze/summary
pub async fn analyze_summary(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SummaryResponse>> {
    let unit = match state.registry().summary() {
        Readiness::Ready(unit) => unit,
        _ => return Err(AppError::ModelNotLoaded(Capability::Summary)),
    };

    // Empty-after-trim input short-circuits without touching the model
    let clean_text = req.text.trim().to_string();
    if clean_text.is_empty() {
        return Ok(Json(SummaryResponse {
            summary_text: String::new(),
        }));
    }

    let raw = invoke(Capability::Summary, move || {
        unit.summarize(&clean_text, SummaryParams::default())
    })
    .await?;

    Ok(Json(normalize::normalize_summary(raw)))
}

/// Run one unit invocation on the blocking pool, with timing and outcome
/// metrics. A unit error is logged and surfaced as a 500 with the capability
/// named; it is never retried.
async fn invoke<R>(
    capability: Capability,
    call: impl FnOnce() -> anyhow::Result<R> + Send + 'static,
) -> Result<R>
where
    R: Send + 'static,
{
    let start = Instant::now();

    let outcome = tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("inference task did not complete: {e}")))?;

    match outcome {
        Ok(value) => {
            metrics::INFERENCE_DURATION
                .with_label_values(&[capability.as_str()])
                .observe(start.elapsed().as_secs_f64());
            metrics::INFERENCE_TOTAL
                .with_label_values(&[capability.as_str(), "success"])
                .inc();
            Ok(value)
        }
        Err(e) => {
            metrics::INFERENCE_TOTAL
                .with_label_values(&[capability.as_str(), "failure"])
                .inc();
            tracing::error!("{} inference failed: {:#}", capability, e);
            Err(AppError::InferenceFailed {
                capability,
                reason: format!("{e:#}"),
            })
        }
    }
}
