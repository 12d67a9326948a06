//! Sentiment classification types.
//!
//! The classifier scores three classes in the order negative, neutral,
//! positive. Degraded paths return [`SentimentResult::uniform_fallback`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Score given to every class when no model result is available.
///
/// Sums to 0.99, kept as-is for wire compatibility with existing clients.
pub const UNIFORM_SCORE: f32 = 0.33;

/// The class with the highest score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        })
    }
}

/// Class probabilities, rounded to three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub negative: f32,
    pub neutral: f32,
    pub positive: f32,
}

impl SentimentResult {
    /// Build from probabilities in (negative, neutral, positive) order,
    /// rounding each to three decimals.
    pub fn from_probabilities(probs: [f32; 3]) -> Self {
        Self {
            negative: round3(probs[0]),
            neutral: round3(probs[1]),
            positive: round3(probs[2]),
        }
    }

    pub fn uniform_fallback() -> Self {
        Self {
            negative: UNIFORM_SCORE,
            neutral: UNIFORM_SCORE,
            positive: UNIFORM_SCORE,
        }
    }

    pub fn is_uniform_fallback(&self) -> bool {
        *self == Self::uniform_fallback()
    }

    /// Arg-max label. Ties resolve toward `Neutral`, then `Positive`.
    pub fn label(&self) -> SentimentLabel {
        if self.neutral >= self.negative && self.neutral >= self.positive {
            SentimentLabel::Neutral
        } else if self.positive >= self.negative {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        }
    }

    /// Probability of [`label`](Self::label).
    pub fn confidence(&self) -> f32 {
        self.negative.max(self.neutral).max(self.positive)
    }

    pub fn sum(&self) -> f32 {
        self.negative + self.neutral + self.positive
    }
}

/// A sentiment result plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    #[serde(flatten)]
    pub scores: SentimentResult,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SentimentReport {
    pub fn classified(scores: SentimentResult) -> Self {
        Self {
            scores,
            degraded: false,
            reason: None,
        }
    }

    /// Uniform scores for input too short to classify. Not degraded.
    pub fn passthrough(reason: impl Into<String>) -> Self {
        Self {
            scores: SentimentResult::uniform_fallback(),
            degraded: false,
            reason: Some(reason.into()),
        }
    }

    /// Uniform scores because the classifier could not run.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            scores: SentimentResult::uniform_fallback(),
            degraded: true,
            reason: Some(reason.into()),
        }
    }
}

fn round3(x: f32) -> f32 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_round_to_three_decimals() {
        let result = SentimentResult::from_probabilities([0.12345, 0.2, 0.67655]);
        assert_eq!(result.negative, 0.123);
        assert_eq!(result.neutral, 0.2);
        assert_eq!(result.positive, 0.677);
    }

    #[test]
    fn uniform_fallback_is_point_three_three() {
        let fallback = SentimentResult::uniform_fallback();
        assert_eq!(fallback.negative, 0.33);
        assert_eq!(fallback.neutral, 0.33);
        assert_eq!(fallback.positive, 0.33);
        assert!(fallback.is_uniform_fallback());
        assert_eq!(fallback.label(), SentimentLabel::Neutral);
    }

    #[test]
    fn label_picks_highest_score() {
        let result = SentimentResult::from_probabilities([0.7, 0.2, 0.1]);
        assert_eq!(result.label(), SentimentLabel::Negative);
        assert_eq!(result.confidence(), 0.7);

        let result = SentimentResult::from_probabilities([0.1, 0.2, 0.7]);
        assert_eq!(result.label(), SentimentLabel::Positive);
    }

    #[test]
    fn report_flattens_scores() {
        let report = SentimentReport::degraded("sentiment classifier unavailable");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["negative"].as_f64().unwrap() as f32, 0.33);
        assert_eq!(json["degraded"], true);
        assert_eq!(json["reason"], "sentiment classifier unavailable");
    }

    #[test]
    fn label_displays_capitalized() {
        assert_eq!(SentimentLabel::Positive.to_string(), "Positive");
    }
}
