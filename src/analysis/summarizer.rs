//! ONNX abstractive summarization unit
//!
//! distilbart-cnn-12-6 exported as separate encoder and decoder graphs.
//! Generation is greedy (the service promises deterministic output): one
//! encoder pass, then token-by-token decoder passes taking the argmax of the
//! final logit row, with EOS suppressed until `min_length` and a hard stop
//! at `max_length`.
//!
//! The decoder export used here has no KV cache, so each step re-runs the
//! decoder over the full prefix. Fine for 130-token summaries; a merged
//! cached decoder would be the upgrade path if latency mattered.

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use super::{RawSummary, Summarizer, SummaryParams};

/// Configuration for the summarization unit.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub encoder_path: PathBuf,
    pub decoder_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Maximum source length in tokens; longer inputs are truncated.
    pub max_input_length: usize,
    /// BART convention: decoding starts from EOS.
    pub decoder_start_token_id: i64,
    pub eos_token_id: i64,
    /// BART-CNN convention: the first generated token is forced to BOS.
    pub forced_bos_token_id: Option<i64>,
    /// ONNX intra-op thread count.
    pub intra_threads: usize,
}

impl SummarizerConfig {
    pub fn distilbart_cnn(model_dir: &Path, intra_threads: usize) -> Self {
        Self {
            encoder_path: model_dir.join("encoder_model_quantized.onnx"),
            decoder_path: model_dir.join("decoder_model_quantized.onnx"),
            tokenizer_path: model_dir.join("tokenizer.json"),
            max_input_length: 1024,
            decoder_start_token_id: 2,
            eos_token_id: 2,
            forced_bos_token_id: Some(0),
            intra_threads,
        }
    }
}

/// Abstractive summarizer backed by ONNX Runtime.
pub struct OnnxSummarizer {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    config: SummarizerConfig,
}

impl OnnxSummarizer {
    /// Construct the unit. Loads two graphs; slow and fallible, intended to
    /// run once from the background loader.
    pub fn new(config: SummarizerConfig) -> Result<Self> {
        tracing::info!(
            "Loading summarizer encoder from {:?} with {} threads",
            config.encoder_path,
            config.intra_threads
        );

        let encoder = Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&config.encoder_path)
            .context("Failed to load encoder ONNX model")?;

        tracing::info!("Loading summarizer decoder from {:?}", config.decoder_path);

        let decoder = Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&config.decoder_path)
            .context("Failed to load decoder ONNX model")?;

        let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {e}"))?;

        tracing::info!("Summarizer loaded");

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            config,
        })
    }

    /// One encoder pass. Returns (hidden_states, [batch, seq, dim] shape,
    /// attention mask) for reuse across decoder steps.
    fn encode_source(&self, text: &str) -> Result<(Vec<f32>, Vec<i64>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {e}"))?;

        let src_len = encoding.get_ids().len().min(self.config.max_input_length);
        let input_ids: Vec<i64> = encoding.get_ids()[..src_len]
            .iter()
            .map(|&t| t as i64)
            .collect();
        let attention: Vec<i64> = encoding.get_attention_mask()[..src_len]
            .iter()
            .map(|&m| m as i64)
            .collect();

        let input_ids_value = Value::from_array((vec![1, src_len], input_ids))
            .context("Failed to create input_ids tensor")?;
        let attention_value = Value::from_array((vec![1, src_len], attention.clone()))
            .context("Failed to create attention_mask tensor")?;

        let mut encoder = self.encoder.lock();
        let outputs = encoder
            .run(ort::inputs![
                "input_ids" => &input_ids_value,
                "attention_mask" => &attention_value,
            ])
            .context("Encoder inference failed")?;

        // last_hidden_state - shape: [1, src_len, hidden]
        let (shape, hidden) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract encoder hidden states")?;

        Ok((hidden.to_vec(), shape.to_vec(), attention))
    }

    /// One decoder pass over the full generated prefix; returns the logit row
    /// for the next-token position.
    fn decode_step(
        &self,
        generated: &[i64],
        hidden: &[f32],
        hidden_shape: &[i64],
        src_attention: &[i64],
    ) -> Result<Vec<f32>> {
        let dec_len = generated.len();

        let decoder_ids_value = Value::from_array((vec![1, dec_len], generated.to_vec()))
            .context("Failed to create decoder input_ids tensor")?;
        let hidden_value = Value::from_array((hidden_shape.to_vec(), hidden.to_vec()))
            .context("Failed to create encoder_hidden_states tensor")?;
        let src_attention_value =
            Value::from_array((vec![1, src_attention.len()], src_attention.to_vec()))
                .context("Failed to create encoder_attention_mask tensor")?;

        let mut decoder = self.decoder.lock();
        let outputs = decoder
            .run(ort::inputs![
                "input_ids" => &decoder_ids_value,
                "encoder_hidden_states" => &hidden_value,
                "encoder_attention_mask" => &src_attention_value,
            ])
            .context("Decoder inference failed")?;

        // logits - shape: [1, dec_len, vocab]
        let (shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract decoder logits")?;

        let vocab = *shape
            .last()
            .context("Decoder logits missing vocab dimension")? as usize;
        let last_row_start = (dec_len - 1) * vocab;

        Ok(logits[last_row_start..last_row_start + vocab].to_vec())
    }
}

impl Summarizer for OnnxSummarizer {
    fn summarize(&self, text: &str, params: SummaryParams) -> Result<Vec<RawSummary>> {
        let (hidden, hidden_shape, src_attention) = self.encode_source(text)?;

        let mut generated = vec![self.config.decoder_start_token_id];
        let mut produced: Vec<i64> = Vec::new();

        while produced.len() < params.max_length {
            let mut logits =
                self.decode_step(&generated, &hidden, &hidden_shape, &src_attention)?;

            // Forced BOS on the first step, per the model's generation config
            let next = match self.config.forced_bos_token_id {
                Some(bos) if produced.is_empty() => bos,
                _ => {
                    if produced.len() < params.min_length {
                        logits[self.config.eos_token_id as usize] = f32::NEG_INFINITY;
                    }
                    argmax(&logits) as i64
                }
            };

            if next == self.config.eos_token_id {
                break;
            }

            produced.push(next);
            generated.push(next);
        }

        let token_ids: Vec<u32> = produced.iter().map(|&t| t as u32).collect();
        let summary_text = self
            .tokenizer
            .decode(&token_ids, true)
            .map_err(|e| anyhow::anyhow!("Failed to decode summary tokens: {e}"))?
            .trim()
            .to_string();

        Ok(vec![RawSummary { summary_text }])
    }
}

fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in row.iter().enumerate() {
        if *v > row[best] {
            best = i;
        }
    }
    best
}
