//! Combined summary + sentiment result.

use serde::{Deserialize, Serialize};

use super::sentiment::SentimentLabel;

/// Summary of a text together with the sentiment of that summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestResult {
    pub summary: String,
    pub sentiment: SentimentLabel,
    /// Probability of `sentiment`.
    pub confidence: f32,
    /// Either stage fell back instead of running its model.
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
