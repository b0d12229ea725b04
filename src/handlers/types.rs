//! Request/response types for the analysis API

use serde::{Deserialize, Serialize};

/// Body of all three analysis endpoints.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// One (label, confidence) pair - the output atom shared by the sentiment
/// and emotion endpoints. Scores are model probabilities in [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledScore {
    pub label: String,
    pub score: f32,
}

/// Summary endpoint response. `summary_text` is "" exactly when the trimmed
/// input was empty; it is never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary_text: String,
}
