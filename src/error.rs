//! Brevity error types

use crate::model::SlotId;

/// Brevity error types
#[derive(Debug, thiserror::Error)]
pub enum BrevityError {
    // Model lifecycle errors
    #[error("failed to load {slot} model: {message}")]
    ModelLoad { slot: SlotId, message: String },

    #[error("model slot unavailable: {0}")]
    SlotUnavailable(SlotId),

    #[error("model source error: {0}")]
    Source(String),

    // Inference errors
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("inference failed: {0}")]
    Inference(String),

    /// The model ran but produced something the pipeline cannot interpret
    /// (wrong tensor shape, wrong number of labels, non-finite scores).
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),

    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("model produced an empty output")]
    EmptyOutput,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Brevity operations
pub type Result<T> = std::result::Result<T, BrevityError>;
