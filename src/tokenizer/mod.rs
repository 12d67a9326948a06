//! Tokenization for the inference pipelines.
//!
//! Pipelines only see the [`TextTokenizer`] trait; the Hugging Face
//! `tokenizers` implementation lives in [`hf`]. Truncation and padding are
//! properties of the tokenizer instance, fixed when a model slot is loaded.

mod hf;

pub use hf::HfTokenizer;

use crate::error::Result;

/// Token ids and masks for a single input sequence, ready to become tensors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedInput {
    /// Build an input whose attention mask covers every token.
    pub fn from_ids(ids: &[u32]) -> Self {
        Self {
            input_ids: ids.iter().map(|&id| i64::from(id)).collect(),
            attention_mask: vec![1; ids.len()],
            token_type_ids: vec![0; ids.len()],
        }
    }

    /// Sequence length, padding included.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of non-padding tokens.
    pub fn attended_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m != 0).count()
    }
}

/// Trait for tokenizer implementations.
pub trait TextTokenizer: Send + Sync {
    /// Encode text with special tokens, applying this tokenizer's
    /// truncation and padding.
    fn encode(&self, text: &str) -> Result<EncodedInput>;

    /// Decode token ids back to text, dropping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Look up the id of a token in the vocabulary.
    fn token_id(&self, token: &str) -> Option<u32>;
}
