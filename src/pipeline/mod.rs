//! Inference pipelines.
//!
//! Each pipeline exposes a total entry point that applies admission rules
//! and fallbacks (`summarize`, `analyze`) and a fallible one that only runs
//! the model (`generate`, `classify`).

pub mod beam;
mod sentiment;
mod summarize;

pub use beam::{BeamSearch, BeamSearchConfig};
pub use sentiment::{NUM_CLASSES, SentimentPipeline};
pub use summarize::{ELLIPSIS, SummarizationPipeline, fallback_summary};

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{BrevityError, Result};

/// Run a model call, turning a panic into [`BrevityError::Inference`].
pub(crate) fn guarded<T>(call: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(BrevityError::Inference(format!(
            "model panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
