//! Inference units
//!
//! The three pretrained models behind the service, each an opaque callable:
//! slow and fallible to construct, cheap to invoke, safe to call from
//! concurrent request handlers.
//!
//! Classification output arrives in runtime-dependent shapes (a flat ranked
//! list, or that list wrapped in a one-element batch). The shape variance is
//! carried through [`RawClassification`] so the normalization layer can
//! resolve it explicitly instead of any caller assuming one form.

pub mod classifier;
pub mod downloader;
pub mod summarizer;

pub use classifier::{Activation, ClassifierConfig, OnnxTextClassifier};
pub use summarizer::{OnnxSummarizer, SummarizerConfig};

use anyhow::Result;

/// One ranked candidate from a classification unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScore {
    pub label: String,
    pub score: f32,
}

/// Classification output as produced by the underlying runtime.
///
/// Some exported pipelines return the ranked list for a single input
/// directly; others wrap it in a batch with one entry per input text.
/// Consumers must handle both.
#[derive(Debug, Clone, PartialEq)]
pub enum RawClassification {
    Flat(Vec<RawScore>),
    Nested(Vec<Vec<RawScore>>),
}

/// Raw summarization output record. Units return one record per input text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSummary {
    pub summary_text: String,
}

/// Decoding constraints for summarization. Deterministic (greedy) decoding
/// is implied; there is no sampling knob.
#[derive(Debug, Clone, Copy)]
pub struct SummaryParams {
    /// Maximum generated length in tokens.
    pub max_length: usize,
    /// Minimum generated length in tokens (EOS suppressed below this).
    pub min_length: usize,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_length: 130,
            min_length: 30,
        }
    }
}

/// A ranked text classifier (sentiment, emotion).
///
/// `top_k = None` means "use the unit's configured default" - the emotion
/// model is built with top-5 ranking baked in, while the sentiment endpoint
/// asks for top-3 at invocation time.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str, top_k: Option<usize>) -> Result<RawClassification>;
}

/// An abstractive summarizer.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, params: SummaryParams) -> Result<Vec<RawSummary>>;
}
