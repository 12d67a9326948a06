//! HuggingFace tokenizers implementation.

use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, TruncationParams};

use super::{EncodedInput, TextTokenizer};
use crate::error::{BrevityError, Result};

/// Pad tokens tried, in order, when the tokenizer file has no padding config.
const PAD_TOKEN_CANDIDATES: &[&str] = &["<pad>", "[PAD]"];

/// HuggingFace tokenizers implementation.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    /// Load tokenizer from a local `tokenizer.json`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            BrevityError::Configuration(format!(
                "Failed to load tokenizer from {:?}: {}",
                path, e
            ))
        })?;

        Ok(Self { inner })
    }

    /// Truncate encoded inputs to at most `max_length` tokens, special
    /// tokens included.
    pub fn with_truncation(mut self, max_length: usize) -> Result<Self> {
        self.inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| {
                BrevityError::Configuration(format!("Failed to configure truncation: {}", e))
            })?;
        Ok(self)
    }

    /// Pad every encoded input to exactly `length` tokens.
    ///
    /// Keeps the pad token declared by the tokenizer file when there is one.
    pub fn with_fixed_padding(mut self, length: usize) -> Result<Self> {
        let mut params = match self.inner.get_padding() {
            Some(existing) => existing.clone(),
            None => {
                let (pad_token, pad_id) = PAD_TOKEN_CANDIDATES
                    .iter()
                    .find_map(|token| {
                        self.inner
                            .token_to_id(token)
                            .map(|id| (token.to_string(), id))
                    })
                    .ok_or_else(|| {
                        BrevityError::Configuration(
                            "Tokenizer has no padding token".to_string(),
                        )
                    })?;
                PaddingParams {
                    pad_token,
                    pad_id,
                    ..Default::default()
                }
            }
        };
        params.strategy = PaddingStrategy::Fixed(length);
        self.inner.with_padding(Some(params));
        Ok(self)
    }
}

impl TextTokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<EncodedInput> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| BrevityError::Tokenization(e.to_string()))?;

        Ok(EncodedInput {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
        })
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| BrevityError::Decode(e.to_string()))
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::Whitespace;

    fn word_level_file(dir: &Path) -> std::path::PathBuf {
        let vocab = [("<pad>", 0), ("</s>", 1), ("<unk>", 2), ("good", 3), ("movie", 4)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token("<unk>".to_string())
            .build()
            .unwrap();
        let mut tokenizer = tokenizers::Tokenizer::new(model);
        tokenizer.with_pre_tokenizer(Some(Whitespace::default()));
        let path = dir.join("tokenizer.json");
        tokenizer.save(&path, false).unwrap();
        path
    }

    #[test]
    fn truncates_and_pads() {
        let dir = tempfile::tempdir().unwrap();
        let path = word_level_file(dir.path());

        let tokenizer = HfTokenizer::from_file(&path)
            .unwrap()
            .with_truncation(3)
            .unwrap()
            .with_fixed_padding(3)
            .unwrap();

        let long = tokenizer.encode("good movie good movie").unwrap();
        assert_eq!(long.input_ids, vec![3, 4, 3]);

        let short = tokenizer.encode("good").unwrap();
        assert_eq!(short.input_ids, vec![3, 0, 0]);
        assert_eq!(short.attention_mask, vec![1, 0, 0]);
        assert_eq!(short.attended_len(), 1);
    }

    #[test]
    fn decode_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = HfTokenizer::from_file(&word_level_file(dir.path())).unwrap();

        assert_eq!(tokenizer.token_id("</s>"), Some(1));
        assert_eq!(tokenizer.token_id("missing"), None);
        assert_eq!(tokenizer.decode(&[3, 4]).unwrap(), "good movie");
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let result = HfTokenizer::from_file(Path::new("/nonexistent/tokenizer.json"));
        assert!(matches!(result, Err(BrevityError::Configuration(_))));
    }
}
