//! Brevity - local summarization and sentiment inference
//!
//! Two models, loaded once per process: a T5-style encoder-decoder that
//! summarizes text with beam search, and a three-class sentiment classifier.
//! Both run through ONNX Runtime on CPU or, with the `cuda` feature, a CUDA
//! device.
//!
//! The [`Brevity`] facade never fails. Text that is too short, a model that
//! could not be loaded, or an inference error all produce a well-formed
//! fallback result marked as degraded where it did not come from a model.
//!
//! # Example
//!
//! ```rust,no_run
//! use brevity::Brevity;
//!
//! fn main() -> brevity::Result<()> {
//!     let brevity = Brevity::builder().build()?;
//!
//!     let summary = brevity.summarize(
//!         "The quick brown fox jumps over the lazy dog many times in a long \
//!          paragraph describing nothing of importance.",
//!     );
//!     let sentiment = brevity.analyze_sentiment(&summary.summary);
//!
//!     println!("{} ({:?})", summary.summary, sentiment.label());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod telemetry;
pub mod tokenizer;
pub mod types;
pub mod version;

#[cfg(feature = "server")]
pub mod server;

// Re-export main types at crate root
pub use config::{
    AdmissionPolicy, BrevityConfig, ClassificationConfig, GenerationConfig, ModelsConfig,
};
pub use error::{BrevityError, Result};
pub use gateway::{Brevity, BrevityBuilder};
pub use model::{
    Device, DeviceConfig, DevicePreference, ModelLoader, ModelRegistry, ModelSource,
    SentimentHandle, SlotId, SlotState, SummarizerHandle,
};
pub use providers::{EncoderOutput, Seq2SeqModel, SequenceClassifier, SpecialTokens};
pub use tokenizer::{EncodedInput, HfTokenizer, TextTokenizer};
pub use types::{DigestResult, SentimentLabel, SentimentReport, SentimentResult, SummaryResult};
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};
