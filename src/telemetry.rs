//! Telemetry metric name constants.
//!
//! Centralised metric names for brevity operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `brevity_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `pipeline`: "summarize" or "sentiment"
//! - `outcome`: "ok", "passthrough" (admission rejected the input),
//!   "unavailable" (model slot not loaded) or "failed" (inference error)
//! - `slot`: "summarizer" or "sentiment_classifier"
//! - `status`: "ok" or "error"

/// `outcome` label values.
pub mod outcome {
    pub const OK: &str = "ok";
    pub const PASSTHROUGH: &str = "passthrough";
    pub const UNAVAILABLE: &str = "unavailable";
    pub const FAILED: &str = "failed";
}

/// Total calls into a pipeline, by outcome.
///
/// Labels: `pipeline`, `outcome`.
pub const INFERENCES_TOTAL: &str = "brevity_inferences_total";

/// Wall-clock duration of model inference in seconds (admitted calls only).
///
/// Labels: `pipeline`.
pub const INFERENCE_DURATION_SECONDS: &str = "brevity_inference_duration_seconds";

/// Model slot load attempts.
///
/// Labels: `slot`, `status` ("ok" | "error").
pub const MODEL_LOADS_TOTAL: &str = "brevity_model_loads_total";

/// Memory reclamation passes run before inference.
///
/// Labels: `device`.
pub const MEMORY_RECLAIMS_TOTAL: &str = "brevity_memory_reclaims_total";

/// Sentiment results whose top class fell below the weak-confidence threshold.
pub const WEAK_SENTIMENT_TOTAL: &str = "brevity_weak_sentiment_total";
