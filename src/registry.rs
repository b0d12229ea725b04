//! Model readiness registry
//!
//! Single source of truth for "can this capability be invoked right now".
//! Each capability gets its own write-once slot: the background loader
//! publishes the construction outcome exactly once, request handlers read it
//! concurrently without locking. A slot never transitions away from Ready.

use std::sync::{Arc, OnceLock};

use crate::analysis::{Summarizer, TextClassifier};

/// The three analysis tasks this service exposes. Fixed for the process
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Sentiment,
    Emotion,
    Summary,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Sentiment,
        Capability::Emotion,
        Capability::Summary,
    ];

    /// Lowercase identifier used in logs, metrics labels, and cache paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Sentiment => "sentiment",
            Capability::Emotion => "emotion",
            Capability::Summary => "summary",
        }
    }

    /// Title-case name used in client-facing messages
    /// ("Sentiment model not loaded").
    pub fn display_name(&self) -> &'static str {
        match self {
            Capability::Sentiment => "Sentiment",
            Capability::Emotion => "Emotion",
            Capability::Summary => "Summary",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one capability's inference unit.
#[derive(Debug, Clone)]
pub enum Readiness<T> {
    /// The loader has not finished (or started) constructing this unit.
    NotLoaded,
    /// Unit constructed and invocable.
    Ready(T),
    /// Construction was attempted once and failed; terminal for this process.
    Failed(String),
}

impl<T> Readiness<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }
}

/// Kind-only view of a slot, for health reporting where the unit types differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessKind {
    NotLoaded,
    Ready,
    Failed,
}

impl ReadinessKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessKind::NotLoaded => "not_loaded",
            ReadinessKind::Ready => "ready",
            ReadinessKind::Failed => "failed",
        }
    }
}

/// Write-once publication slot for a constructed unit.
///
/// `OnceLock` gives atomic visibility of the single assignment: a reader
/// either sees nothing or the fully constructed outcome, never a partial
/// write.
struct Slot<T: ?Sized>(OnceLock<Result<Arc<T>, String>>);

impl<T: ?Sized> Slot<T> {
    fn new() -> Self {
        Self(OnceLock::new())
    }

    fn get(&self) -> Readiness<Arc<T>> {
        match self.0.get() {
            None => Readiness::NotLoaded,
            Some(Ok(unit)) => Readiness::Ready(Arc::clone(unit)),
            Some(Err(e)) => Readiness::Failed(e.clone()),
        }
    }

    fn kind(&self) -> ReadinessKind {
        match self.0.get() {
            None => ReadinessKind::NotLoaded,
            Some(Ok(_)) => ReadinessKind::Ready,
            Some(Err(_)) => ReadinessKind::Failed,
        }
    }

    /// Returns false if the slot was already written (the write is ignored,
    /// preserving monotonicity).
    fn set(&self, outcome: Result<Arc<T>, String>) -> bool {
        self.0.set(outcome).is_ok()
    }
}

/// Process-wide readiness registry, one slot per capability.
///
/// Written only by the background loader, read by every request handler.
pub struct ModelRegistry {
    sentiment: Slot<dyn TextClassifier>,
    emotion: Slot<dyn TextClassifier>,
    summary: Slot<dyn Summarizer>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            sentiment: Slot::new(),
            emotion: Slot::new(),
            summary: Slot::new(),
        }
    }

    pub fn sentiment(&self) -> Readiness<Arc<dyn TextClassifier>> {
        self.sentiment.get()
    }

    pub fn emotion(&self) -> Readiness<Arc<dyn TextClassifier>> {
        self.emotion.get()
    }

    pub fn summary(&self) -> Readiness<Arc<dyn Summarizer>> {
        self.summary.get()
    }

    /// Kind-only readiness for health/metrics reporting.
    pub fn readiness_of(&self, capability: Capability) -> ReadinessKind {
        match capability {
            Capability::Sentiment => self.sentiment.kind(),
            Capability::Emotion => self.emotion.kind(),
            Capability::Summary => self.summary.kind(),
        }
    }

    pub fn all_ready(&self) -> bool {
        Capability::ALL
            .iter()
            .all(|c| self.readiness_of(*c) == ReadinessKind::Ready)
    }

    pub fn set_sentiment(&self, outcome: Result<Arc<dyn TextClassifier>, String>) {
        if !self.sentiment.set(outcome) {
            tracing::warn!("sentiment readiness already recorded, ignoring second write");
        }
    }

    pub fn set_emotion(&self, outcome: Result<Arc<dyn TextClassifier>, String>) {
        if !self.emotion.set(outcome) {
            tracing::warn!("emotion readiness already recorded, ignoring second write");
        }
    }

    pub fn set_summary(&self, outcome: Result<Arc<dyn Summarizer>, String>) {
        if !self.summary.set(outcome) {
            tracing::warn!("summary readiness already recorded, ignoring second write");
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
