//! Bhaav - text-analysis service
//!
//! Small HTTP server exposing three pretrained-model capabilities:
//! sentiment polarity, multi-label emotion, and abstractive summarization.
//!
//! # Key properties
//! - Models load in a background task; the server accepts connections
//!   immediately and answers 503 per capability until its model is ready
//! - Each capability loads (or fails) independently of the others
//! - Raw model output shapes are normalized into a fixed response schema
//!   per endpoint
//!
//! # Local-first operation
//! - ONNX models auto-downloaded to ~/.cache/bhaav/ on first start
//! - `BHAAV_OFFLINE=true` disables downloads (missing models stay 503)

pub mod analysis;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod loader;
pub mod metrics;
pub mod middleware;
pub mod registry;

// Re-export so tests and downstream users share the same versions
pub use anyhow;
pub use parking_lot;
