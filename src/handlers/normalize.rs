//! Response normalizers
//!
//! The layer between a unit's raw, shape-variable output and the fixed
//! response schema each endpoint guarantees. Normalizers only reshape and
//! case-fold; they never rescale scores, re-rank, pad, or truncate beyond
//! what the unit returned.

use crate::analysis::{RawClassification, RawSummary};

use super::types::{LabeledScore, SummaryResponse};

/// Resolve the flat-vs-nested ambiguity: a nested result is the one-element
/// batch form, so unwrap exactly one level and take the first (only) entry.
fn flatten(raw: RawClassification) -> Vec<crate::analysis::RawScore> {
    match raw {
        RawClassification::Flat(scores) => scores,
        RawClassification::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
    }
}

/// Sentiment: labels uppercased verbatim, scores and order passed through.
/// Fewer than 3 entries is passthrough, not an error.
pub fn normalize_sentiment(raw: RawClassification) -> Vec<LabeledScore> {
    flatten(raw)
        .into_iter()
        .map(|s| LabeledScore {
            label: s.label.to_uppercase(),
            score: s.score,
        })
        .collect()
}

/// Emotion: labels lowercased verbatim, scores and order passed through.
/// The unit is configured upstream to rank its top 5; no re-truncation here.
pub fn normalize_emotion(raw: RawClassification) -> Vec<LabeledScore> {
    flatten(raw)
        .into_iter()
        .map(|s| LabeledScore {
            label: s.label.to_lowercase(),
            score: s.score,
        })
        .collect()
}

/// Summary: first result's text verbatim, no post-processing.
pub fn normalize_summary(raw: Vec<RawSummary>) -> SummaryResponse {
    SummaryResponse {
        summary_text: raw.into_iter().next().map(|s| s.summary_text).unwrap_or_default(),
    }
}
