//! Summarization result type.

use serde::{Deserialize, Serialize};

/// Outcome of a summarize call.
///
/// `degraded` is set when the text did not go through the model because the
/// summarizer is unavailable or inference failed. A short input passed
/// through unchanged is not degraded but still carries a `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SummaryResult {
    /// A summary produced by the model.
    pub fn generated(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            degraded: false,
            reason: None,
        }
    }

    /// Input returned as-is because it is too short to summarize.
    pub fn passthrough(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            summary: text.into(),
            degraded: false,
            reason: Some(reason.into()),
        }
    }

    /// A fallback produced without the model.
    pub fn degraded(summary: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            degraded: true,
            reason: Some(reason.into()),
        }
    }
}
