//! Model implementations behind the pipeline traits.
//!
//! - [`traits`]: what the pipelines need from a model
//! - [`onnx_t5`]: encoder/decoder generation on ONNX Runtime
//! - [`onnx_classifier`]: sequence classification on ONNX Runtime

pub mod onnx_classifier;
pub mod onnx_t5;
mod session;
pub mod traits;

pub use onnx_classifier::OnnxSequenceClassifier;
pub use onnx_t5::OnnxSeq2SeqModel;
pub use traits::{DeviceCache, EncoderOutput, Seq2SeqModel, SequenceClassifier, SpecialTokens};
