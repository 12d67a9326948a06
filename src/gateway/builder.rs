//! Builder for configuring Brevity instances

use std::path::PathBuf;

use tracing::info;

use super::Brevity;
use crate::config::{AdmissionPolicy, BrevityConfig, GenerationConfig};
use crate::model::{
    Device, MemoryReclaimer, ModelLoader, ModelRegistry, OnnxModelLoader, resolve_device,
};
use crate::pipeline::{SentimentPipeline, SummarizationPipeline};
use crate::{BrevityError, Result};

/// Builder for configuring Brevity instances.
pub struct BrevityBuilder {
    config: BrevityConfig,
    loader: Option<Box<dyn ModelLoader>>,
    device: Option<Device>,
}

impl BrevityBuilder {
    pub fn new() -> Self {
        Self {
            config: BrevityConfig::default(),
            loader: None,
            device: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: BrevityConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the length gates and fallback shapes.
    pub fn policy(mut self, policy: AdmissionPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set the summarization parameters.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Set the cache directory for Hub downloads.
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.models.cache_dir = path.into();
        self
    }

    /// Use a custom model loader instead of loading ONNX exports.
    pub fn loader(mut self, loader: impl ModelLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Pin the device instead of resolving it from the device preference.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    fn validate(&self) -> Result<()> {
        let generation = &self.config.generation;
        if generation.num_beams == 0 {
            return Err(BrevityError::Configuration(
                "generation.num_beams must be at least 1".to_string(),
            ));
        }
        if generation.max_length < 2 {
            return Err(BrevityError::Configuration(
                "generation.max_length must leave room for at least one token".to_string(),
            ));
        }
        if generation.max_input_tokens == 0 || self.config.classification.max_tokens == 0 {
            return Err(BrevityError::Configuration(
                "token limits must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the device, load both model slots and assemble the pipelines.
    ///
    /// Model load failures do not fail the build; the affected slot is
    /// reported as failed and its pipeline serves fallbacks.
    pub fn build(self) -> Result<Brevity> {
        self.validate()?;

        let device = self
            .device
            .unwrap_or_else(|| resolve_device(&self.config.device));
        let config = self.config;
        let loader = self.loader.unwrap_or_else(|| {
            Box::new(OnnxModelLoader::new(
                config.models.clone(),
                &config.generation,
                &config.classification,
            ))
        });

        let registry = ModelRegistry::new(loader, device);
        registry.load_all();

        let reclaimer = MemoryReclaimer::new(device);
        let summarizer =
            SummarizationPipeline::new(config.policy.clone(), config.generation, reclaimer);
        let sentiment = SentimentPipeline::new(config.policy.clone(), reclaimer);

        info!(device = device.name(), "brevity ready");
        Ok(Brevity::new(registry, summarizer, sentiment, config.policy))
    }
}

impl Default for BrevityBuilder {
    fn default() -> Self {
        Self::new()
    }
}
