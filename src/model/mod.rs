//! Model lifecycle: device selection, sources, loading and memory.

pub mod device;
pub mod loader;
pub mod reclaim;
pub mod registry;
pub mod source;

pub use device::{Device, DeviceConfig, DevicePreference, resolve_device};
pub use loader::{ModelLoader, OnnxModelLoader};
pub use reclaim::MemoryReclaimer;
pub use registry::{
    ModelRegistry, ModelSlot, SentimentHandle, SlotId, SlotState, SummarizerHandle,
};
pub use source::{ModelSource, default_cache_dir};
