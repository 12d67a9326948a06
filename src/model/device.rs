//! Device selection for local inference.

use serde::Deserialize;
use tracing::{info, warn};

/// Compute device for local inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// CPU execution (default).
    #[default]
    Cpu,

    /// CUDA GPU execution.
    #[cfg(feature = "cuda")]
    Cuda {
        /// GPU device ID (0-indexed).
        device_id: u32,
    },
}

impl Device {
    /// Create CPU device.
    pub fn cpu() -> Self {
        Self::Cpu
    }

    /// Create CUDA device with the given device ID.
    #[cfg(feature = "cuda")]
    pub fn cuda(device_id: u32) -> Self {
        Self::Cuda { device_id }
    }

    /// Get the device name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            #[cfg(feature = "cuda")]
            Self::Cuda { .. } => "CUDA",
        }
    }

    /// Whether inference runs on an accelerator with its own memory pool.
    pub fn is_accelerated(&self) -> bool {
        match self {
            Self::Cpu => false,
            #[cfg(feature = "cuda")]
            Self::Cuda { .. } => true,
        }
    }
}

/// Which device the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Use an accelerator when one is usable, CPU otherwise.
    #[default]
    Auto,
    /// Always run on CPU.
    Cpu,
    /// Prefer CUDA; falls back to CPU with a warning when unusable.
    Cuda,
}

/// Device configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub preference: DevicePreference,
    /// CUDA device ordinal probed for `auto` and `cuda`.
    #[serde(default)]
    pub cuda_device_id: u32,
}

/// Pick the device every model load and inference call will use.
///
/// Called once at startup; the result is handed to the registry and the
/// memory reclaimer rather than looked up again.
pub fn resolve_device(config: &DeviceConfig) -> Device {
    let device = match config.preference {
        DevicePreference::Cpu => Device::Cpu,
        DevicePreference::Auto => probe_accelerator(config.cuda_device_id).unwrap_or_default(),
        DevicePreference::Cuda => match probe_accelerator(config.cuda_device_id) {
            Some(device) => device,
            None => {
                warn!(
                    device_id = config.cuda_device_id,
                    "CUDA requested but not usable, falling back to CPU"
                );
                Device::Cpu
            }
        },
    };
    info!(device = device.name(), "resolved inference device");
    device
}

#[cfg(feature = "cuda")]
fn probe_accelerator(device_id: u32) -> Option<Device> {
    use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};

    match CUDAExecutionProvider::default()
        .with_device_id(device_id as i32)
        .is_available()
    {
        Ok(true) => Some(Device::Cuda { device_id }),
        Ok(false) => None,
        Err(e) => {
            warn!(error = %e, "CUDA availability probe failed");
            None
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn probe_accelerator(_device_id: u32) -> Option<Device> {
    None
}
