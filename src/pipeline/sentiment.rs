//! Three-class sentiment classification.

use std::time::Instant;

use tracing::{debug, error, warn};

use super::guarded;
use crate::config::AdmissionPolicy;
use crate::error::{BrevityError, Result};
use crate::model::{MemoryReclaimer, ModelRegistry, SentimentHandle, SlotId};
use crate::telemetry::{self, outcome};
use crate::types::{SentimentReport, SentimentResult};

const PIPELINE: &str = "sentiment";

/// Number of classes the classifier must output (negative, neutral, positive).
pub const NUM_CLASSES: usize = 3;

/// Scores text as negative, neutral or positive, never failing.
#[derive(Debug, Clone)]
pub struct SentimentPipeline {
    policy: AdmissionPolicy,
    reclaimer: MemoryReclaimer,
}

impl SentimentPipeline {
    pub fn new(policy: AdmissionPolicy, reclaimer: MemoryReclaimer) -> Self {
        Self { policy, reclaimer }
    }

    /// Classify `text`, returning the uniform fallback when the input is too
    /// short, the classifier is unavailable, or inference fails or panics.
    pub fn analyze(&self, registry: &ModelRegistry, text: &str) -> SentimentReport {
        let chars = text.chars().count();
        if chars < self.policy.sentiment_min_chars {
            record(outcome::PASSTHROUGH);
            return SentimentReport::passthrough("text too short for sentiment analysis");
        }

        let Some(handle) = registry.sentiment() else {
            warn!("sentiment classifier not loaded, returning uniform scores");
            record(outcome::UNAVAILABLE);
            return SentimentReport::degraded(
                BrevityError::SlotUnavailable(SlotId::SentimentClassifier).to_string(),
            );
        };

        let start = Instant::now();
        let result = guarded(|| self.classify(handle, text));
        metrics::histogram!(telemetry::INFERENCE_DURATION_SECONDS, "pipeline" => PIPELINE)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(scores) => {
                record(outcome::OK);
                SentimentReport::classified(scores)
            }
            Err(e) => {
                error!(error = %e, input_chars = chars, "sentiment analysis failed, using uniform scores");
                record(outcome::FAILED);
                SentimentReport::degraded(e.to_string())
            }
        }
    }

    /// Run the classifier and turn its logits into rounded probabilities.
    pub fn classify(&self, handle: &SentimentHandle, text: &str) -> Result<SentimentResult> {
        self.reclaimer.reclaim(handle.model.as_ref());

        let input = handle.tokenizer.encode(text)?;
        let logits = handle.model.logits(&input)?;
        if logits.len() != NUM_CLASSES {
            return Err(BrevityError::UnexpectedOutput(format!(
                "expected {} logits, got {}",
                NUM_CLASSES,
                logits.len()
            )));
        }
        if logits.iter().any(|x| !x.is_finite()) {
            return Err(BrevityError::UnexpectedOutput(
                "classifier produced non-finite logits".to_string(),
            ));
        }

        let probs = softmax(&logits);
        let result = SentimentResult::from_probabilities([probs[0], probs[1], probs[2]]);

        if result.confidence() < self.policy.weak_confidence {
            warn!(
                label = %result.label(),
                confidence = result.confidence(),
                threshold = self.policy.weak_confidence,
                "weak sentiment signal"
            );
            metrics::counter!(telemetry::WEAK_SENTIMENT_TOTAL).increment(1);
        } else {
            debug!(label = %result.label(), confidence = result.confidence(), "sentiment classified");
        }
        Ok(result)
    }
}

/// Softmax over raw logits.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|x| x / sum).collect()
}

fn record(outcome: &'static str) {
    metrics::counter!(telemetry::INFERENCES_TOTAL,
        "pipeline" => PIPELINE,
        "outcome" => outcome,
    )
    .increment(1);
}
