//! Encoder-decoder generation via ONNX Runtime.
//!
//! Expects the two-graph layout produced by the usual T5 ONNX export:
//! an encoder graph (`input_ids`, `attention_mask` → `last_hidden_state`)
//! and a decoder graph without past key values (`input_ids`,
//! `encoder_attention_mask`, `encoder_hidden_states` → `logits`).

use std::path::Path;

use ort::value::TensorRef;

use super::session::{OnnxSession, extract_f32, run_session};
use super::traits::{DeviceCache, EncoderOutput, Seq2SeqModel, SpecialTokens};
use crate::error::{BrevityError, Result};
use crate::model::Device;
use crate::tokenizer::EncodedInput;

/// T5-style seq2seq model split into encoder and decoder sessions.
pub struct OnnxSeq2SeqModel {
    encoder: OnnxSession,
    decoder: OnnxSession,
    special_tokens: SpecialTokens,
}

impl OnnxSeq2SeqModel {
    /// Load both graphs onto `device`.
    pub fn new(
        encoder_path: &Path,
        decoder_path: &Path,
        device: Device,
        special_tokens: SpecialTokens,
    ) -> Result<Self> {
        Ok(Self {
            encoder: OnnxSession::load(encoder_path, device)?,
            decoder: OnnxSession::load(decoder_path, device)?,
            special_tokens,
        })
    }
}

impl DeviceCache for OnnxSeq2SeqModel {
    fn release_cached_memory(&self) -> Result<()> {
        self.encoder.request_arena_shrink();
        self.decoder.request_arena_shrink();
        Ok(())
    }
}

impl Seq2SeqModel for OnnxSeq2SeqModel {
    fn encode(&self, input: &EncodedInput) -> Result<EncoderOutput> {
        if input.is_empty() {
            return Err(BrevityError::InvalidInput("empty encoder input".to_string()));
        }

        let seq_len = input.len();
        let shape = [1_usize, seq_len];

        let input_ids = TensorRef::from_array_view((shape, input.input_ids.as_slice()))
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to create input_ids tensor: {}", e))
            })?;
        let attention_mask = TensorRef::from_array_view((shape, input.attention_mask.as_slice()))
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to create attention_mask tensor: {}", e))
            })?;

        let mut session = self.encoder.lock();
        let outputs = run_session!(
            self.encoder,
            session,
            ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ]
        )?;

        let (dims, hidden) = extract_f32(outputs.get("last_hidden_state"), "last_hidden_state")?;
        let [_, out_len, hidden_size] = dims[..] else {
            return Err(BrevityError::UnexpectedOutput(format!(
                "expected rank-3 encoder output, got shape {:?}",
                dims
            )));
        };

        EncoderOutput::new(hidden, out_len, hidden_size, input.attention_mask.clone())
    }

    fn next_token_logits(
        &self,
        encoder: &EncoderOutput,
        decoder_input_ids: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        let batch = decoder_input_ids.len();
        let dec_len = decoder_input_ids.first().map(Vec::len).unwrap_or(0);
        if batch == 0 || dec_len == 0 {
            return Err(BrevityError::InvalidInput(
                "decoder needs at least one non-empty sequence".to_string(),
            ));
        }
        if decoder_input_ids.iter().any(|seq| seq.len() != dec_len) {
            return Err(BrevityError::InvalidInput(
                "decoder sequences must share one length".to_string(),
            ));
        }

        // Every beam attends to the same encoder output.
        let ids: Vec<i64> = decoder_input_ids
            .iter()
            .flat_map(|seq| seq.iter().map(|&id| i64::from(id)))
            .collect();
        let mask: Vec<i64> = encoder.attention_mask.repeat(batch);
        let hidden: Vec<f32> = encoder.hidden_states.repeat(batch);

        let ids_tensor = TensorRef::from_array_view(([batch, dec_len], ids.as_slice()))
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to create decoder input tensor: {}", e))
            })?;
        let mask_tensor = TensorRef::from_array_view(([batch, encoder.seq_len], mask.as_slice()))
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to create encoder mask tensor: {}", e))
            })?;
        let hidden_tensor = TensorRef::from_array_view((
            [batch, encoder.seq_len, encoder.hidden_size],
            hidden.as_slice(),
        ))
        .map_err(|e| {
            BrevityError::Inference(format!("Failed to create hidden state tensor: {}", e))
        })?;

        let mut session = self.decoder.lock();
        let outputs = run_session!(
            self.decoder,
            session,
            ort::inputs![
                "input_ids" => ids_tensor,
                "encoder_attention_mask" => mask_tensor,
                "encoder_hidden_states" => hidden_tensor,
            ]
        )?;

        let (dims, logits) = extract_f32(outputs.get("logits"), "logits")?;
        let [out_batch, out_len, vocab] = dims[..] else {
            return Err(BrevityError::UnexpectedOutput(format!(
                "expected rank-3 decoder logits, got shape {:?}",
                dims
            )));
        };
        if out_batch != batch || out_len != dec_len {
            return Err(BrevityError::UnexpectedOutput(format!(
                "decoder logits shape {:?} does not match input [{}, {}]",
                dims, batch, dec_len
            )));
        }

        // Keep only the last position of each sequence.
        Ok((0..batch)
            .map(|b| {
                let start = (b * out_len + out_len - 1) * vocab;
                logits[start..start + vocab].to_vec()
            })
            .collect())
    }

    fn special_tokens(&self) -> SpecialTokens {
        self.special_tokens
    }
}
