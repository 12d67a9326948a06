//! Core configuration: model bundles, admission policy and inference
//! parameters.
//!
//! Every section has a default, so an empty config describes the stock
//! deployment: a local T5 export in `./t5_model` and a three-class
//! sentiment model from the Hub. A model section that is present must name
//! its `source`. The daemon reads these from TOML (see
//! `server::config`); library users can build them directly.

use std::path::PathBuf;

use serde::Deserialize;

use crate::model::{DeviceConfig, ModelSource, default_cache_dir};

/// Everything the core needs to load models and serve requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrevityConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub policy: AdmissionPolicy,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
}

/// The two model bundles.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory for Hub downloads.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub summarizer: SummarizerSpec,
    #[serde(default)]
    pub sentiment: ClassifierSpec,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            summarizer: SummarizerSpec::default(),
            sentiment: ClassifierSpec::default(),
        }
    }
}

/// Files making up the summarization bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerSpec {
    #[serde(flatten)]
    pub source: ModelSource,
    #[serde(default = "default_encoder_file")]
    pub encoder_file: String,
    #[serde(default = "default_decoder_file")]
    pub decoder_file: String,
    #[serde(default = "default_tokenizer_file")]
    pub tokenizer_file: String,
    /// Model config holding special token ids. Optional in the bundle.
    #[serde(default = "default_model_config_file")]
    pub config_file: String,
}

impl Default for SummarizerSpec {
    fn default() -> Self {
        Self {
            source: default_summarizer_source(),
            encoder_file: default_encoder_file(),
            decoder_file: default_decoder_file(),
            tokenizer_file: default_tokenizer_file(),
            config_file: default_model_config_file(),
        }
    }
}

fn default_summarizer_source() -> ModelSource {
    ModelSource::local("./t5_model")
}

fn default_encoder_file() -> String {
    "encoder_model.onnx".to_string()
}

fn default_decoder_file() -> String {
    "decoder_model.onnx".to_string()
}

fn default_tokenizer_file() -> String {
    "tokenizer.json".to_string()
}

fn default_model_config_file() -> String {
    "config.json".to_string()
}

/// Hub repository holding the default sentiment bundle.
///
/// The upstream `cardiffnlp/twitter-roberta-base-sentiment-latest` repo ships
/// PyTorch weights and a BPE vocab only. This one is the same model exported
/// to ONNX with a `tokenizer.json`, labels in the order negative, neutral,
/// positive.
pub const DEFAULT_SENTIMENT_REPO: &str = "Xenova/twitter-roberta-base-sentiment-latest";

/// Files making up the sentiment bundle.
///
/// The source must hold an ONNX export (`model_file`) and a fast tokenizer
/// (`tokenizer_file`); a plain PyTorch checkpoint does not load.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSpec {
    #[serde(flatten)]
    pub source: ModelSource,
    #[serde(default = "default_classifier_file")]
    pub model_file: String,
    #[serde(default = "default_tokenizer_file")]
    pub tokenizer_file: String,
    /// Feed `token_type_ids` to the graph (BERT-style exports).
    #[serde(default)]
    pub token_type_ids: bool,
}

impl Default for ClassifierSpec {
    fn default() -> Self {
        Self {
            source: default_sentiment_source(),
            model_file: default_classifier_file(),
            tokenizer_file: default_tokenizer_file(),
            token_type_ids: false,
        }
    }
}

fn default_sentiment_source() -> ModelSource {
    ModelSource::huggingface(DEFAULT_SENTIMENT_REPO)
}

fn default_classifier_file() -> String {
    "onnx/model.onnx".to_string()
}

/// Length gates and fallback shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionPolicy {
    /// Inputs shorter than this (in characters) are returned unsummarized.
    #[serde(default = "default_summary_min_chars")]
    pub summary_min_chars: usize,
    /// Inputs shorter than this get the uniform sentiment fallback.
    #[serde(default = "default_sentiment_min_chars")]
    pub sentiment_min_chars: usize,
    /// Inputs shorter than this skip summarization in `digest`.
    #[serde(default = "default_digest_min_chars")]
    pub digest_min_chars: usize,
    /// Characters kept by the summary fallback after an inference failure.
    #[serde(default = "default_fallback_summary_chars")]
    pub fallback_summary_chars: usize,
    /// Top-class probability below which a sentiment result is logged as weak.
    #[serde(default = "default_weak_confidence")]
    pub weak_confidence: f32,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            summary_min_chars: default_summary_min_chars(),
            sentiment_min_chars: default_sentiment_min_chars(),
            digest_min_chars: default_digest_min_chars(),
            fallback_summary_chars: default_fallback_summary_chars(),
            weak_confidence: default_weak_confidence(),
        }
    }
}

fn default_summary_min_chars() -> usize {
    10
}

fn default_sentiment_min_chars() -> usize {
    5
}

fn default_digest_min_chars() -> usize {
    30
}

fn default_fallback_summary_chars() -> usize {
    150
}

fn default_weak_confidence() -> f32 {
    0.55
}

/// Summarization parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Task prefix prepended to the input text.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Input truncation length in tokens.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    /// Maximum decoder length, decoder start token included.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// EOS is suppressed until the decoder sequence reaches this length.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Exponent applied to hypothesis length when scoring finished beams.
    #[serde(default = "default_length_penalty")]
    pub length_penalty: f32,
    #[serde(default = "default_num_beams")]
    pub num_beams: usize,
    /// Stop once `num_beams` hypotheses are finished.
    #[serde(default = "default_early_stopping")]
    pub early_stopping: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            max_input_tokens: default_max_input_tokens(),
            max_length: default_max_length(),
            min_length: default_min_length(),
            length_penalty: default_length_penalty(),
            num_beams: default_num_beams(),
            early_stopping: default_early_stopping(),
        }
    }
}

fn default_prefix() -> String {
    "summarize: ".to_string()
}

fn default_max_input_tokens() -> usize {
    512
}

fn default_max_length() -> usize {
    100
}

fn default_min_length() -> usize {
    30
}

fn default_length_penalty() -> f32 {
    2.0
}

fn default_num_beams() -> usize {
    2
}

fn default_early_stopping() -> bool {
    true
}

/// Sentiment parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    /// Inputs are truncated and padded to exactly this many tokens.
    #[serde(default = "default_classifier_tokens")]
    pub max_tokens: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_classifier_tokens(),
        }
    }
}

fn default_classifier_tokens() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_deployment() {
        let config = BrevityConfig::default();
        assert_eq!(config.policy.summary_min_chars, 10);
        assert_eq!(config.policy.sentiment_min_chars, 5);
        assert_eq!(config.policy.fallback_summary_chars, 150);
        assert_eq!(config.generation.max_length, 100);
        assert_eq!(config.generation.min_length, 30);
        assert_eq!(config.generation.num_beams, 2);
        assert!(config.generation.early_stopping);
        assert_eq!(config.generation.max_input_tokens, 512);
        assert_eq!(config.classification.max_tokens, 256);
        assert_eq!(config.models.summarizer.source, ModelSource::local("./t5_model"));
    }

    #[test]
    fn default_sentiment_bundle_is_an_onnx_export() {
        let sentiment = ClassifierSpec::default();
        assert_eq!(
            sentiment.source,
            ModelSource::huggingface(DEFAULT_SENTIMENT_REPO)
        );
        assert_eq!(sentiment.model_file, "onnx/model.onnx");
        assert_eq!(sentiment.tokenizer_file, "tokenizer.json");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: BrevityConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.generation.prefix, "summarize: ");
        assert!((config.generation.length_penalty - 2.0).abs() < f32::EPSILON);
        assert!((config.policy.weak_confidence - 0.55).abs() < f32::EPSILON);
    }

    #[test]
    fn model_section_overrides_source_and_files() {
        let json = r#"{
            "models": {
                "summarizer": {"source": "hub", "repo_id": "org/t5-small-onnx"},
                "sentiment": {"source": "local", "path": "/opt/sentiment", "token_type_ids": true}
            }
        }"#;
        let config: BrevityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.models.summarizer.source,
            ModelSource::huggingface("org/t5-small-onnx")
        );
        assert_eq!(config.models.summarizer.decoder_file, "decoder_model.onnx");
        assert_eq!(config.models.sentiment.source, ModelSource::local("/opt/sentiment"));
        assert!(config.models.sentiment.token_type_ids);
    }
}
