//! Model auto-downloader
//!
//! Fetches the ONNX export of each capability's model on first use.
//! Files are cached in ~/.cache/bhaav/models/<capability>/
//!
//! Downloads are streamed to disk with a SHA-256 digest computed on the fly
//! and logged, so a cache can be audited against the upstream repo after the
//! fact. `BHAAV_OFFLINE=true` (see config) disables all fetching; missing
//! files then fail unit construction.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::registry::Capability;

/// One required file of a model bundle.
pub struct ModelFile {
    pub filename: &'static str,
    pub url: &'static str,
}

/// Sentiment: cardiffnlp/twitter-roberta-base-sentiment-latest (quantized
/// community ONNX export, ~125MB).
const SENTIMENT_FILES: &[ModelFile] = &[
    ModelFile {
        filename: "model_quantized.onnx",
        url: "https://huggingface.co/Xenova/twitter-roberta-base-sentiment-latest/resolve/main/onnx/model_quantized.onnx",
    },
    ModelFile {
        filename: "tokenizer.json",
        url: "https://huggingface.co/Xenova/twitter-roberta-base-sentiment-latest/resolve/main/tokenizer.json",
    },
];

/// Emotion: SamLowe/roberta-base-go_emotions (official ONNX export).
const EMOTION_FILES: &[ModelFile] = &[
    ModelFile {
        filename: "model_quantized.onnx",
        url: "https://huggingface.co/SamLowe/roberta-base-go_emotions-onnx/resolve/main/onnx/model_quantized.onnx",
    },
    ModelFile {
        filename: "tokenizer.json",
        url: "https://huggingface.co/SamLowe/roberta-base-go_emotions-onnx/resolve/main/tokenizer.json",
    },
];

/// Summary: sshleifer/distilbart-cnn-12-6 (quantized encoder/decoder export).
const SUMMARY_FILES: &[ModelFile] = &[
    ModelFile {
        filename: "encoder_model_quantized.onnx",
        url: "https://huggingface.co/Xenova/distilbart-cnn-12-6/resolve/main/onnx/encoder_model_quantized.onnx",
    },
    ModelFile {
        filename: "decoder_model_quantized.onnx",
        url: "https://huggingface.co/Xenova/distilbart-cnn-12-6/resolve/main/onnx/decoder_model_quantized.onnx",
    },
    ModelFile {
        filename: "tokenizer.json",
        url: "https://huggingface.co/Xenova/distilbart-cnn-12-6/resolve/main/tokenizer.json",
    },
];

/// Get the cache directory for bhaav.
pub fn get_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        return cache.join("bhaav");
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".cache").join("bhaav");
    }

    // Last resort: current directory
    PathBuf::from(".bhaav-cache")
}

/// Default on-disk location for one capability's model bundle.
pub fn models_dir(capability: Capability) -> PathBuf {
    get_cache_dir().join("models").join(capability.as_str())
}

/// The files a capability's unit needs on disk before construction.
pub fn required_files(capability: Capability) -> &'static [ModelFile] {
    match capability {
        Capability::Sentiment => SENTIMENT_FILES,
        Capability::Emotion => EMOTION_FILES,
        Capability::Summary => SUMMARY_FILES,
    }
}

/// Resolve the model directory for a capability and make sure every required
/// file exists there, downloading into the cache when allowed.
///
/// With `base_override` set (BHAAV_MODEL_DIR), files are expected at
/// `<override>/<capability>/` and are never downloaded - an operator-managed
/// directory is treated as authoritative.
pub fn ensure_model_files(
    capability: Capability,
    base_override: Option<&Path>,
    offline: bool,
) -> Result<PathBuf> {
    let dir = match base_override {
        Some(base) => base.join(capability.as_str()),
        None => models_dir(capability),
    };

    let missing: Vec<&ModelFile> = required_files(capability)
        .iter()
        .filter(|f| !dir.join(f.filename).exists())
        .collect();

    if missing.is_empty() {
        return Ok(dir);
    }

    if base_override.is_some() {
        anyhow::bail!(
            "{} model files missing from configured model dir {:?}: {}",
            capability,
            dir,
            missing
                .iter()
                .map(|f| f.filename)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if offline {
        anyhow::bail!(
            "{} model files missing at {:?} and BHAAV_OFFLINE=true",
            capability,
            dir
        );
    }

    tracing::info!(
        "{} model files missing at {:?}, downloading {} file(s)",
        capability,
        dir,
        missing.len()
    );

    for file in missing {
        download_file(file.url, &dir.join(file.filename))?;
    }

    Ok(dir)
}

/// Download a single file, streaming to disk with a running SHA-256 digest.
fn download_file(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading {} to {:?}", url, path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create cache directory")?;
    }

    // ureq: blocking HTTP keeps the loader free of any runtime dependency
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("Failed to download from {url}"))?;

    let mut reader = response.into_reader();

    // Write to a temp name first so a partial download never passes the
    // exists() check on the next start.
    let tmp_path = path.with_extension("part");
    let mut file = fs::File::create(&tmp_path).context("Failed to create output file")?;

    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .context("Failed to read from download stream")?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("Failed to write to file")?;
        hasher.update(&buffer[..bytes_read]);
        downloaded += bytes_read as u64;
    }

    file.flush().context("Failed to flush output file")?;
    drop(file);
    fs::rename(&tmp_path, path).context("Failed to move download into place")?;

    tracing::info!(
        "Downloaded {} bytes to {:?} (SHA-256: {})",
        downloaded,
        path,
        hex::encode(hasher.finalize())
    );

    Ok(())
}
