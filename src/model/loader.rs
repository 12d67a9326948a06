//! Construction of the concrete models behind each slot.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::Device;
use super::registry::{SentimentHandle, SummarizerHandle};
use crate::config::{ClassificationConfig, GenerationConfig, ModelsConfig};
use crate::error::{BrevityError, Result};
use crate::model::SlotId;
use crate::providers::{OnnxSeq2SeqModel, OnnxSequenceClassifier, SpecialTokens};
use crate::tokenizer::{HfTokenizer, TextTokenizer};

/// Builds model + tokenizer pairs for the registry.
///
/// The registry calls each method at most once per process.
pub trait ModelLoader: Send + Sync {
    fn load_summarizer(&self, device: Device) -> Result<SummarizerHandle>;
    fn load_sentiment(&self, device: Device) -> Result<SentimentHandle>;
}

/// Loads ONNX exports described by [`ModelsConfig`].
pub struct OnnxModelLoader {
    models: ModelsConfig,
    max_input_tokens: usize,
    classifier_tokens: usize,
}

impl OnnxModelLoader {
    pub fn new(
        models: ModelsConfig,
        generation: &GenerationConfig,
        classification: &ClassificationConfig,
    ) -> Self {
        Self {
            models,
            max_input_tokens: generation.max_input_tokens,
            classifier_tokens: classification.max_tokens,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load_summarizer(&self, device: Device) -> Result<SummarizerHandle> {
        let spec = &self.models.summarizer;
        let cache_dir = &self.models.cache_dir;
        debug!(source = %spec.source.describe(), "loading summarizer");

        let load = || -> Result<SummarizerHandle> {
            let tokenizer_path = spec.source.resolve_file(&spec.tokenizer_file, cache_dir)?;
            let tokenizer =
                HfTokenizer::from_file(&tokenizer_path)?.with_truncation(self.max_input_tokens)?;

            let config_path = spec.source.resolve_optional(&spec.config_file, cache_dir);
            let special_tokens = special_tokens(config_path.as_deref(), &tokenizer);

            let encoder_path = spec.source.resolve_file(&spec.encoder_file, cache_dir)?;
            let decoder_path = spec.source.resolve_file(&spec.decoder_file, cache_dir)?;
            let model =
                OnnxSeq2SeqModel::new(&encoder_path, &decoder_path, device, special_tokens)?;

            Ok(SummarizerHandle {
                model: Box::new(model),
                tokenizer: Box::new(tokenizer),
            })
        };

        load().map_err(|e| BrevityError::ModelLoad {
            slot: SlotId::Summarizer,
            message: format!("{} ({})", e, spec.source.describe()),
        })
    }

    fn load_sentiment(&self, device: Device) -> Result<SentimentHandle> {
        let spec = &self.models.sentiment;
        let cache_dir = &self.models.cache_dir;
        debug!(source = %spec.source.describe(), "loading sentiment classifier");

        let load = || -> Result<SentimentHandle> {
            let tokenizer_path = spec.source.resolve_file(&spec.tokenizer_file, cache_dir)?;
            let tokenizer = HfTokenizer::from_file(&tokenizer_path)?
                .with_truncation(self.classifier_tokens)?
                .with_fixed_padding(self.classifier_tokens)?;

            let model_path = spec.source.resolve_file(&spec.model_file, cache_dir)?;
            let model = OnnxSequenceClassifier::new(&model_path, device, spec.token_type_ids)?;

            Ok(SentimentHandle {
                model: Box::new(model),
                tokenizer: Box::new(tokenizer),
            })
        };

        load().map_err(|e| BrevityError::ModelLoad {
            slot: SlotId::SentimentClassifier,
            message: format!("{} ({})", e, spec.source.describe()),
        })
    }
}

/// Special token ids as declared in a model `config.json`.
#[derive(Debug, Default, Deserialize)]
struct ModelTokenConfig {
    decoder_start_token_id: Option<u32>,
    eos_token_id: Option<u32>,
    pad_token_id: Option<u32>,
}

impl ModelTokenConfig {
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Resolve generation tokens: model config first, then the tokenizer
/// vocabulary, then T5 conventions.
fn special_tokens(config_path: Option<&Path>, tokenizer: &dyn TextTokenizer) -> SpecialTokens {
    let declared = match config_path.map(ModelTokenConfig::read) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            warn!(error = %e, "unreadable model config, using tokenizer special tokens");
            ModelTokenConfig::default()
        }
        None => ModelTokenConfig::default(),
    };
    let fallback = SpecialTokens::default();

    let pad = declared
        .pad_token_id
        .or_else(|| tokenizer.token_id("<pad>"))
        .unwrap_or(fallback.pad);
    SpecialTokens {
        decoder_start: declared.decoder_start_token_id.unwrap_or(pad),
        eos: declared
            .eos_token_id
            .or_else(|| tokenizer.token_id("</s>"))
            .unwrap_or(fallback.eos),
        pad,
    }
}
