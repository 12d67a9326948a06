//! Model registry: one write-once slot per model.
//!
//! The registry owns the summarizer and sentiment classifier for the whole
//! process. Each slot is filled at most once by [`ModelRegistry::load_all`];
//! a slot whose load fails stays failed, and the other slot is unaffected.
//! After loading, slots are read without locking.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info};

use super::Device;
use super::loader::ModelLoader;
use crate::providers::{Seq2SeqModel, SequenceClassifier};
use crate::telemetry;
use crate::tokenizer::TextTokenizer;

/// Identity of a model slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    Summarizer,
    SentimentClassifier,
}

impl SlotId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarizer => "summarizer",
            Self::SentimentClassifier => "sentiment_classifier",
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum SlotState {
    Unloaded,
    Loaded,
    LoadFailed(String),
}

/// Summarization model and its tokenizer. Always handed out together.
pub struct SummarizerHandle {
    pub model: Box<dyn Seq2SeqModel>,
    pub tokenizer: Box<dyn TextTokenizer>,
}

/// Sentiment classifier and its tokenizer. Always handed out together.
pub struct SentimentHandle {
    pub model: Box<dyn SequenceClassifier>,
    pub tokenizer: Box<dyn TextTokenizer>,
}

/// A write-once holder for one loaded model.
pub struct ModelSlot<H> {
    id: SlotId,
    device: Device,
    cell: OnceLock<std::result::Result<H, String>>,
}

impl<H> ModelSlot<H> {
    fn new(id: SlotId, device: Device) -> Self {
        Self {
            id,
            device,
            cell: OnceLock::new(),
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn state(&self) -> SlotState {
        match self.cell.get() {
            None => SlotState::Unloaded,
            Some(Ok(_)) => SlotState::Loaded,
            Some(Err(message)) => SlotState::LoadFailed(message.clone()),
        }
    }

    /// The loaded handle, or `None` when unloaded or failed.
    pub fn get(&self) -> Option<&H> {
        self.cell.get().and_then(|slot| slot.as_ref().ok())
    }

    /// Fill the slot with `load` unless it was already filled.
    ///
    /// Errors and panics from `load` mark the slot failed; nothing escapes.
    fn load_with(&self, load: impl FnOnce() -> crate::Result<H>) {
        let mut attempted = false;
        self.cell.get_or_init(|| {
            attempted = true;
            let start = Instant::now();
            let outcome = match catch_unwind(AssertUnwindSafe(load)) {
                Ok(Ok(handle)) => Ok(handle),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("model loader panicked".to_string()),
            };

            let status = match &outcome {
                Ok(_) => {
                    info!(
                        slot = %self.id,
                        device = self.device.name(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "model loaded"
                    );
                    "ok"
                }
                Err(message) => {
                    error!(slot = %self.id, error = %message, "model load failed; slot disabled");
                    "error"
                }
            };
            metrics::counter!(telemetry::MODEL_LOADS_TOTAL,
                "slot" => self.id.as_str(),
                "status" => status,
            )
            .increment(1);

            outcome
        });

        if !attempted {
            debug!(slot = %self.id, "slot already initialised, skipping load");
        }
    }
}

/// Owner of both model slots.
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    device: Device,
    summarizer: ModelSlot<SummarizerHandle>,
    sentiment: ModelSlot<SentimentHandle>,
}

impl ModelRegistry {
    /// Create a registry with both slots unloaded.
    pub fn new(loader: Box<dyn ModelLoader>, device: Device) -> Self {
        Self {
            loader,
            device,
            summarizer: ModelSlot::new(SlotId::Summarizer, device),
            sentiment: ModelSlot::new(SlotId::SentimentClassifier, device),
        }
    }

    /// Load both slots. Idempotent; a slot is never loaded twice and a
    /// failed slot is never retried.
    pub fn load_all(&self) {
        self.summarizer
            .load_with(|| self.loader.load_summarizer(self.device));
        self.sentiment
            .load_with(|| self.loader.load_sentiment(self.device));
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn summarizer(&self) -> Option<&SummarizerHandle> {
        self.summarizer.get()
    }

    pub fn sentiment(&self) -> Option<&SentimentHandle> {
        self.sentiment.get()
    }

    pub fn state(&self, slot: SlotId) -> SlotState {
        match slot {
            SlotId::Summarizer => self.summarizer.state(),
            SlotId::SentimentClassifier => self.sentiment.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_ids_render_snake_case() {
        assert_eq!(SlotId::Summarizer.to_string(), "summarizer");
        assert_eq!(
            serde_json::to_string(&SlotId::SentimentClassifier).unwrap(),
            "\"sentiment_classifier\""
        );
    }

    #[test]
    fn slot_state_serializes_error() {
        let json = serde_json::to_value(SlotState::LoadFailed("missing file".into())).unwrap();
        assert_eq!(json["state"], "load_failed");
        assert_eq!(json["error"], "missing file");
        let json = serde_json::to_value(SlotState::Loaded).unwrap();
        assert_eq!(json["state"], "loaded");
    }

    #[test]
    fn slot_is_write_once() {
        let slot: ModelSlot<u32> = ModelSlot::new(SlotId::Summarizer, Device::Cpu);
        assert_eq!(slot.state(), SlotState::Unloaded);

        slot.load_with(|| Ok(7));
        slot.load_with(|| Ok(9));
        assert_eq!(slot.get(), Some(&7));
        assert_eq!(slot.state(), SlotState::Loaded);
    }

    #[test]
    fn failed_slot_is_not_retried() {
        let slot: ModelSlot<u32> = ModelSlot::new(SlotId::SentimentClassifier, Device::Cpu);
        slot.load_with(|| Err(crate::BrevityError::Source("no such repo".into())));
        slot.load_with(|| Ok(1));

        assert!(slot.get().is_none());
        match slot.state() {
            SlotState::LoadFailed(message) => assert!(message.contains("no such repo")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn panicking_loader_marks_slot_failed() {
        let slot: ModelSlot<u32> = ModelSlot::new(SlotId::Summarizer, Device::Cpu);
        slot.load_with(|| panic!("native library missing"));
        assert!(matches!(slot.state(), SlotState::LoadFailed(_)));
    }
}
