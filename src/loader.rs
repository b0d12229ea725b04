//! Background model loader
//!
//! Constructs the three inference units off the request-handling path and
//! publishes each outcome into the readiness registry. The server is already
//! accepting connections while this runs; endpoints answer 503 until their
//! capability's slot flips to Ready.
//!
//! Each capability is attempted in isolation, exactly once per process: a
//! failure is logged, recorded as Failed, and loading proceeds to the next
//! capability. There is no retry and no reload endpoint.

use std::sync::Arc;
use std::time::Instant;

use crate::analysis::{
    downloader, ClassifierConfig, OnnxSummarizer, OnnxTextClassifier, SummarizerConfig,
    Summarizer, TextClassifier,
};
use crate::config::ServerConfig;
use crate::metrics;
use crate::registry::{Capability, ModelRegistry};

/// Dispatch the loader as a fire-and-forget blocking task. Completion is
/// observed only through the registry, never awaited by request handling.
pub fn spawn(registry: Arc<ModelRegistry>, config: ServerConfig) {
    tokio::task::spawn_blocking(move || load_all(&registry, &config));
}

/// Construct all three units sequentially. Sequential is sufficient here:
/// this is a one-time cold-start cost and the units contend for the same
/// CPU anyway.
pub fn load_all(registry: &ModelRegistry, config: &ServerConfig) {
    tracing::info!("Background model loading started");

    registry.set_sentiment(construct(Capability::Sentiment, || {
        let dir = downloader::ensure_model_files(
            Capability::Sentiment,
            config.model_dir.as_deref(),
            config.offline,
        )?;
        let unit = OnnxTextClassifier::new(ClassifierConfig::sentiment(&dir, config.onnx_threads))?;
        Ok(Arc::new(unit) as Arc<dyn TextClassifier>)
    }));

    registry.set_emotion(construct(Capability::Emotion, || {
        let dir = downloader::ensure_model_files(
            Capability::Emotion,
            config.model_dir.as_deref(),
            config.offline,
        )?;
        let unit = OnnxTextClassifier::new(ClassifierConfig::emotion(&dir, config.onnx_threads))?;
        Ok(Arc::new(unit) as Arc<dyn TextClassifier>)
    }));

    registry.set_summary(construct(Capability::Summary, || {
        let dir = downloader::ensure_model_files(
            Capability::Summary,
            config.model_dir.as_deref(),
            config.offline,
        )?;
        let unit = OnnxSummarizer::new(SummarizerConfig::distilbart_cnn(&dir, config.onnx_threads))?;
        Ok(Arc::new(unit) as Arc<dyn Summarizer>)
    }));

    tracing::info!("Background model loading finished");
}

/// Run one construction attempt, contain its failure, and time it.
fn construct<T: ?Sized>(
    capability: Capability,
    build: impl FnOnce() -> anyhow::Result<Arc<T>>,
) -> Result<Arc<T>, String> {
    tracing::info!("Loading {} model...", capability);
    let start = Instant::now();

    match build() {
        Ok(unit) => {
            let elapsed = start.elapsed();
            metrics::MODEL_LOAD_DURATION
                .with_label_values(&[capability.as_str()])
                .observe(elapsed.as_secs_f64());
            metrics::MODEL_LOAD_TOTAL
                .with_label_values(&[capability.as_str(), "success"])
                .inc();
            tracing::info!("{} model loaded in {:.1}s", capability, elapsed.as_secs_f64());
            Ok(unit)
        }
        Err(e) => {
            metrics::MODEL_LOAD_TOTAL
                .with_label_values(&[capability.as_str(), "failure"])
                .inc();
            // Contained: the capability stays unavailable, the process lives on
            tracing::error!("Failed to load {} model: {:#}", capability, e);
            Err(format!("{e:#}"))
        }
    }
}
