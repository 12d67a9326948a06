//! Abstractive summarization with a T5-style encoder-decoder.

use std::time::Instant;

use tracing::{debug, error, warn};

use super::beam::{BeamSearch, BeamSearchConfig};
use super::guarded;
use crate::config::{AdmissionPolicy, GenerationConfig};
use crate::error::{BrevityError, Result};
use crate::model::{MemoryReclaimer, ModelRegistry, SlotId, SummarizerHandle};
use crate::telemetry::{self, outcome};
use crate::types::SummaryResult;

const PIPELINE: &str = "summarize";

/// Appended to a truncated fallback summary.
pub const ELLIPSIS: &str = "...";

/// Turns text into a [`SummaryResult`], never failing.
#[derive(Debug, Clone)]
pub struct SummarizationPipeline {
    policy: AdmissionPolicy,
    generation: GenerationConfig,
    reclaimer: MemoryReclaimer,
}

impl SummarizationPipeline {
    pub fn new(
        policy: AdmissionPolicy,
        generation: GenerationConfig,
        reclaimer: MemoryReclaimer,
    ) -> Self {
        Self {
            policy,
            generation,
            reclaimer,
        }
    }

    /// Default maximum decoder length.
    pub fn default_max_length(&self) -> usize {
        self.generation.max_length
    }

    /// Summarize `text`, falling back instead of failing.
    ///
    /// - shorter than `summary_min_chars`: returned unchanged
    /// - summarizer unavailable: returned unchanged, degraded
    /// - inference error or panic: truncated to `fallback_summary_chars`,
    ///   degraded
    /// - empty generation: treated as an inference error
    pub fn summarize(
        &self,
        registry: &ModelRegistry,
        text: &str,
        max_length: usize,
    ) -> SummaryResult {
        let chars = text.chars().count();
        if chars < self.policy.summary_min_chars {
            debug!(chars, "text too short to summarize, returning unchanged");
            record(outcome::PASSTHROUGH);
            return SummaryResult::passthrough(text, "text too short to summarize");
        }

        let Some(handle) = registry.summarizer() else {
            warn!("summarizer not loaded, returning text unchanged");
            record(outcome::UNAVAILABLE);
            return SummaryResult::degraded(
                text,
                BrevityError::SlotUnavailable(SlotId::Summarizer).to_string(),
            );
        };

        let start = Instant::now();
        let result = guarded(|| self.generate(handle, text, max_length));
        metrics::histogram!(telemetry::INFERENCE_DURATION_SECONDS, "pipeline" => PIPELINE)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(summary) => {
                debug!(
                    input_chars = chars,
                    summary_chars = summary.chars().count(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "summary generated"
                );
                record(outcome::OK);
                SummaryResult::generated(summary)
            }
            Err(e) => {
                error!(error = %e, input_chars = chars, "summarization failed, using truncated input");
                record(outcome::FAILED);
                SummaryResult::degraded(
                    fallback_summary(text, self.policy.fallback_summary_chars),
                    e.to_string(),
                )
            }
        }
    }

    /// Run the model: reclaim memory, encode, beam search, decode.
    pub fn generate(
        &self,
        handle: &SummarizerHandle,
        text: &str,
        max_length: usize,
    ) -> Result<String> {
        self.reclaimer.reclaim(handle.model.as_ref());

        let prompt = format!("{}{}", self.generation.prefix, text);
        let input = handle.tokenizer.encode(&prompt)?;
        if input.is_empty() {
            return Err(BrevityError::Tokenization(
                "input produced no tokens".to_string(),
            ));
        }
        let encoder = handle.model.encode(&input)?;

        let special = handle.model.special_tokens();
        let config = BeamSearchConfig {
            max_length,
            ..BeamSearchConfig::from(&self.generation)
        };
        let tokens = BeamSearch::new(config, special.decoder_start, special.eos)
            .run(|beams| handle.model.next_token_logits(&encoder, beams))?;

        let summary = handle.tokenizer.decode(&tokens)?.trim().to_string();
        if summary.is_empty() {
            return Err(BrevityError::EmptyOutput);
        }
        Ok(summary)
    }
}

/// The input if it fits in `max_chars` characters, else its first
/// `max_chars` characters followed by `...`.
pub fn fallback_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
    }
}

fn record(outcome: &'static str) {
    metrics::counter!(telemetry::INFERENCES_TOTAL,
        "pipeline" => PIPELINE,
        "outcome" => outcome,
    )
    .increment(1);
}
