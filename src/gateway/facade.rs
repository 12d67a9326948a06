//! The request facade.
//!
//! Every method here is total: whatever happens inside the pipelines, the
//! caller gets a well-formed result. Degraded results say so.

use super::BrevityBuilder;
use crate::config::AdmissionPolicy;
use crate::model::{Device, ModelRegistry};
use crate::pipeline::{SentimentPipeline, SummarizationPipeline};
use crate::types::{DigestResult, SentimentLabel, SentimentReport, SentimentResult, SummaryResult};

/// Note attached to a digest whose input skipped summarization.
pub const DIGEST_TOO_SHORT_NOTE: &str = "Text too short for summarization";

/// Confidence reported for a digest whose input skipped summarization.
const DIGEST_TOO_SHORT_CONFIDENCE: f32 = 0.5;

/// Summarization and sentiment over a loaded [`ModelRegistry`].
///
/// `Send + Sync`; share it behind an `Arc`.
pub struct Brevity {
    registry: ModelRegistry,
    summarizer: SummarizationPipeline,
    sentiment: SentimentPipeline,
    policy: AdmissionPolicy,
}

impl Brevity {
    /// Create a new builder for configuring an instance.
    pub fn builder() -> BrevityBuilder {
        BrevityBuilder::new()
    }

    pub(crate) fn new(
        registry: ModelRegistry,
        summarizer: SummarizationPipeline,
        sentiment: SentimentPipeline,
        policy: AdmissionPolicy,
    ) -> Self {
        Self {
            registry,
            summarizer,
            sentiment,
            policy,
        }
    }

    /// Summarize with the configured maximum length.
    pub fn summarize(&self, text: &str) -> SummaryResult {
        self.summarize_with_max_length(text, self.summarizer.default_max_length())
    }

    pub fn summarize_with_max_length(&self, text: &str, max_length: usize) -> SummaryResult {
        self.summarizer.summarize(&self.registry, text, max_length)
    }

    /// Sentiment probabilities, or the uniform fallback.
    pub fn analyze_sentiment(&self, text: &str) -> SentimentResult {
        self.sentiment_report(text).scores
    }

    /// Sentiment probabilities plus whether they are a fallback.
    pub fn sentiment_report(&self, text: &str) -> SentimentReport {
        self.sentiment.analyze(&self.registry, text)
    }

    /// Summarize `text`, then classify the sentiment of the summary.
    pub fn digest(&self, text: &str) -> DigestResult {
        if text.chars().count() < self.policy.digest_min_chars {
            return DigestResult {
                summary: text.to_string(),
                sentiment: SentimentLabel::Neutral,
                confidence: DIGEST_TOO_SHORT_CONFIDENCE,
                degraded: false,
                note: Some(DIGEST_TOO_SHORT_NOTE.to_string()),
            };
        }

        let summary = self.summarize(text);
        let report = self.sentiment_report(&summary.summary);

        let note = if summary.degraded {
            summary.reason.clone()
        } else if report.degraded {
            report.reason.clone()
        } else {
            None
        };

        DigestResult {
            sentiment: report.scores.label(),
            confidence: report.scores.confidence(),
            degraded: summary.degraded || report.degraded,
            summary: summary.summary,
            note,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn device(&self) -> Device {
        self.registry.device()
    }
}
