//! ONNX sequence-classification unit
//!
//! One implementation backs both ranking capabilities:
//! - Sentiment: cardiffnlp/twitter-roberta-base-sentiment-latest
//!   (3 labels, softmax)
//! - Emotion: SamLowe/roberta-base-go_emotions
//!   (28 labels, multi-label sigmoid, top-5 configured at construction)
//!
//! The two presets also differ in output shape: the emotion export emits a
//! one-element batch around the ranked list, the sentiment export emits the
//! list directly. That difference is preserved in [`RawClassification`] and
//! resolved downstream by the normalizers.

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use super::{RawClassification, RawScore, TextClassifier};

/// How logits become scores in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Mutually exclusive labels (sentiment polarity).
    Softmax,
    /// Independent per-label probabilities (multi-label emotion).
    Sigmoid,
}

/// Configuration for one classifier unit.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Label vocabulary in the model's output-index order.
    pub labels: Vec<String>,
    /// Maximum sequence length; longer inputs are truncated.
    pub max_length: usize,
    pub activation: Activation,
    /// Ranking depth baked in at construction time. `None` means return all
    /// labels unless the caller asks for fewer.
    pub default_top_k: Option<usize>,
    /// Whether this export wraps single-input results in a one-element batch.
    pub batch_output: bool,
    /// ONNX intra-op thread count.
    pub intra_threads: usize,
}

impl ClassifierConfig {
    /// Sentiment preset. Ranking depth is chosen per invocation, not here.
    pub fn sentiment(model_dir: &Path, intra_threads: usize) -> Self {
        Self {
            model_path: model_dir.join("model_quantized.onnx"),
            tokenizer_path: model_dir.join("tokenizer.json"),
            labels: vec![
                "negative".to_string(),
                "neutral".to_string(),
                "positive".to_string(),
            ],
            max_length: 128,
            activation: Activation::Softmax,
            default_top_k: None,
            batch_output: false,
            intra_threads,
        }
    }

    /// Emotion preset, ranked top-5 of the 28-label go_emotions vocabulary.
    pub fn emotion(model_dir: &Path, intra_threads: usize) -> Self {
        Self {
            model_path: model_dir.join("model_quantized.onnx"),
            tokenizer_path: model_dir.join("tokenizer.json"),
            labels: GO_EMOTIONS_LABELS.iter().map(|s| s.to_string()).collect(),
            max_length: 128,
            activation: Activation::Sigmoid,
            default_top_k: Some(5),
            batch_output: true,
            intra_threads,
        }
    }
}

/// go_emotions label vocabulary in output-index order.
const GO_EMOTIONS_LABELS: &[&str] = &[
    "admiration",
    "amusement",
    "anger",
    "annoyance",
    "approval",
    "caring",
    "confusion",
    "curiosity",
    "desire",
    "disappointment",
    "disapproval",
    "disgust",
    "embarrassment",
    "excitement",
    "fear",
    "gratitude",
    "grief",
    "joy",
    "love",
    "nervousness",
    "optimism",
    "pride",
    "realization",
    "relief",
    "remorse",
    "sadness",
    "surprise",
    "neutral",
];

/// Text classifier backed by ONNX Runtime.
pub struct OnnxTextClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    config: ClassifierConfig,
}

impl OnnxTextClassifier {
    /// Construct the unit. Expensive (graph load and optimization) and
    /// fallible; intended to run once, from the background loader.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        tracing::info!(
            "Loading classifier from {:?} with {} threads",
            config.model_path,
            config.intra_threads
        );

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&config.model_path)
            .context("Failed to load ONNX model")?;

        let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {e}"))?;

        tracing::info!("Classifier loaded ({} labels)", config.labels.len());

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            config,
        })
    }

    fn run_logits(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {e}"))?;

        let tokens = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();
        let max_length = self.config.max_length;

        // Truncate or pad to max_length
        let mut input_ids = vec![0i64; max_length];
        let mut attention = vec![0i64; max_length];

        for (i, &token) in tokens.iter().take(max_length).enumerate() {
            input_ids[i] = token as i64;
        }
        for (i, &mask) in attention_mask.iter().take(max_length).enumerate() {
            attention[i] = mask as i64;
        }

        let input_ids_value = Value::from_array((vec![1, max_length], input_ids))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_value = Value::from_array((vec![1, max_length], attention))
            .context("Failed to create attention_mask tensor")?;

        let mut session = self.session.lock();

        // RoBERTa exports take no token_type_ids
        let outputs = session
            .run(ort::inputs![
                "input_ids" => &input_ids_value,
                "attention_mask" => &attention_mask_value,
            ])
            .context("Classifier inference failed")?;

        // Logits - shape: [1, num_labels]
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract classifier output tensor")?;
        let (_shape, logits) = output_tensor;

        if logits.len() != self.config.labels.len() {
            anyhow::bail!(
                "Model emitted {} logits but {} labels are configured",
                logits.len(),
                self.config.labels.len()
            );
        }

        Ok(logits.to_vec())
    }

    fn rank(&self, logits: &[f32], top_k: Option<usize>) -> Vec<RawScore> {
        let scores = match self.config.activation {
            Activation::Softmax => softmax(logits),
            Activation::Sigmoid => sigmoid(logits),
        };

        let mut ranked: Vec<RawScore> = self
            .config
            .labels
            .iter()
            .zip(scores)
            .map(|(label, score)| RawScore {
                label: label.clone(),
                score,
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        if let Some(k) = top_k.or(self.config.default_top_k) {
            ranked.truncate(k);
        }

        ranked
    }
}

impl TextClassifier for OnnxTextClassifier {
    fn classify(&self, text: &str, top_k: Option<usize>) -> Result<RawClassification> {
        let logits = self.run_logits(text)?;
        let ranked = self.rank(&logits, top_k);

        Ok(if self.config.batch_output {
            RawClassification::Nested(vec![ranked])
        } else {
            RawClassification::Flat(ranked)
        })
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Element-wise logistic sigmoid.
fn sigmoid(logits: &[f32]) -> Vec<f32> {
    logits.iter().map(|x| 1.0 / (1.0 + (-x).exp())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_values_stable() {
        let probs = softmax(&[1000.0, 1001.0, 1002.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sigmoid_range() {
        let probs = sigmoid(&[-10.0, 0.0, 10.0]);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sentiment_preset_shape() {
        let cfg = ClassifierConfig::sentiment(Path::new("/tmp/models"), 2);
        assert_eq!(cfg.labels, vec!["negative", "neutral", "positive"]);
        assert_eq!(cfg.activation, Activation::Softmax);
        assert!(!cfg.batch_output);
        assert_eq!(cfg.default_top_k, None);
    }

    #[test]
    fn emotion_preset_shape() {
        let cfg = ClassifierConfig::emotion(Path::new("/tmp/models"), 2);
        assert_eq!(cfg.labels.len(), 28);
        assert_eq!(cfg.activation, Activation::Sigmoid);
        assert!(cfg.batch_output);
        assert_eq!(cfg.default_top_k, Some(5));
    }
}
