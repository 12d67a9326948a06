//! Sequence classification via ONNX Runtime.

use std::path::Path;

use ort::value::TensorRef;

use super::session::{OnnxSession, extract_f32, run_session};
use super::traits::{DeviceCache, SequenceClassifier};
use crate::error::{BrevityError, Result};
use crate::model::Device;
use crate::tokenizer::EncodedInput;

/// Classifier exported with a `logits` output of shape `[batch, num_labels]`.
pub struct OnnxSequenceClassifier {
    session: OnnxSession,
    /// BERT-style exports take `token_type_ids`; RoBERTa-style ones do not.
    token_type_ids: bool,
}

impl OnnxSequenceClassifier {
    /// Load the classifier graph onto `device`.
    pub fn new(model_path: &Path, device: Device, token_type_ids: bool) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::load(model_path, device)?,
            token_type_ids,
        })
    }
}

impl DeviceCache for OnnxSequenceClassifier {
    fn release_cached_memory(&self) -> Result<()> {
        self.session.request_arena_shrink();
        Ok(())
    }
}

impl SequenceClassifier for OnnxSequenceClassifier {
    fn logits(&self, input: &EncodedInput) -> Result<Vec<f32>> {
        let seq_len = input.len();
        let shape = [1_usize, seq_len];

        // ort takes (shape, slice) views
        let input_ids = TensorRef::from_array_view((shape, input.input_ids.as_slice()))
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to create input_ids tensor: {}", e))
            })?;
        let attention_mask = TensorRef::from_array_view((shape, input.attention_mask.as_slice()))
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to create attention_mask tensor: {}", e))
            })?;

        let mut session = self.session.lock();
        let outputs = if self.token_type_ids {
            let token_type_ids =
                TensorRef::from_array_view((shape, input.token_type_ids.as_slice())).map_err(
                    |e| {
                        BrevityError::Inference(format!(
                            "Failed to create token_type_ids tensor: {}",
                            e
                        ))
                    },
                )?;
            run_session!(
                self.session,
                session,
                ort::inputs![
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask,
                    "token_type_ids" => token_type_ids,
                ]
            )?
        } else {
            run_session!(
                self.session,
                session,
                ort::inputs![
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask,
                ]
            )?
        };

        let (dims, logits) = extract_f32(outputs.get("logits"), "logits")?;
        match dims[..] {
            [1, num_labels] if num_labels == logits.len() => Ok(logits),
            _ => Err(BrevityError::UnexpectedOutput(format!(
                "expected logits of shape [1, num_labels], got {:?}",
                dims
            ))),
        }
    }
}
