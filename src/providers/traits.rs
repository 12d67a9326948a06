//! Model traits the pipelines run against.
//!
//! Pipelines never touch ONNX Runtime directly. They drive a
//! [`Seq2SeqModel`] or a [`SequenceClassifier`], which keeps the generation
//! and scoring logic independent of the runtime and lets the registry hold
//! in-memory models in tests.

use crate::error::{BrevityError, Result};
use crate::tokenizer::EncodedInput;

/// A model that keeps a device-side memory pool between runs.
pub trait DeviceCache: Send + Sync {
    /// Release cached-but-unused device memory.
    ///
    /// Default implementation does nothing (host-only models).
    fn release_cached_memory(&self) -> Result<()> {
        Ok(())
    }
}

/// Token ids that drive generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    /// First token fed to the decoder.
    pub decoder_start: u32,
    /// Token that ends a sequence.
    pub eos: u32,
    /// Padding token.
    pub pad: u32,
}

impl Default for SpecialTokens {
    /// T5 conventions: decoding starts from the pad token.
    fn default() -> Self {
        Self {
            decoder_start: 0,
            eos: 1,
            pad: 0,
        }
    }
}

/// Encoder output for one input sequence, reused across decoding steps.
#[derive(Debug, Clone)]
pub struct EncoderOutput {
    /// Row-major `[seq_len, hidden_size]` hidden states.
    pub hidden_states: Vec<f32>,
    pub seq_len: usize,
    pub hidden_size: usize,
    /// Attention mask of the encoder input.
    pub attention_mask: Vec<i64>,
}

impl EncoderOutput {
    /// Wrap hidden states, checking they match the declared shape.
    pub fn new(
        hidden_states: Vec<f32>,
        seq_len: usize,
        hidden_size: usize,
        attention_mask: Vec<i64>,
    ) -> Result<Self> {
        if hidden_states.len() != seq_len * hidden_size || attention_mask.len() != seq_len {
            return Err(BrevityError::UnexpectedOutput(format!(
                "encoder output of {} values does not match [{}, {}] with mask of {}",
                hidden_states.len(),
                seq_len,
                hidden_size,
                attention_mask.len()
            )));
        }
        Ok(Self {
            hidden_states,
            seq_len,
            hidden_size,
            attention_mask,
        })
    }
}

/// Encoder-decoder language model (T5 family).
pub trait Seq2SeqModel: DeviceCache {
    /// Run the encoder once over the tokenized input.
    fn encode(&self, input: &EncodedInput) -> Result<EncoderOutput>;

    /// Next-token logits for each decoder sequence.
    ///
    /// All sequences have the same length; the result has one
    /// vocabulary-sized row per sequence, taken at the last position.
    fn next_token_logits(
        &self,
        encoder: &EncoderOutput,
        decoder_input_ids: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>>;

    /// Special tokens for generation.
    fn special_tokens(&self) -> SpecialTokens;
}

/// Sequence classification model.
pub trait SequenceClassifier: DeviceCache {
    /// Raw class logits for one input.
    fn logits(&self, input: &EncodedInput) -> Result<Vec<f32>>;
}
