//! Shared ONNX Runtime session plumbing.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::DynValue;
use tracing::warn;

use crate::error::{BrevityError, Result};
use crate::model::Device;

/// An ONNX session bound to one device.
///
/// `Session::run` needs `&mut`, so the session sits behind a mutex and
/// concurrent calls on the same model serialize.
pub(crate) struct OnnxSession {
    session: Mutex<Session>,
    device: Device,
    shrink_pending: AtomicBool,
}

impl OnnxSession {
    /// Load a model file onto `device`.
    pub(crate) fn load(model_path: &Path, device: Device) -> Result<Self> {
        Ok(Self {
            session: Mutex::new(build_session(model_path, &device)?),
            device,
            shrink_pending: AtomicBool::new(false),
        })
    }

    /// Lock the session. A run that panicked leaves no partial state in the
    /// session, so a poisoned lock is recovered.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| {
            warn!("ONNX session lock poisoned by an earlier panic, recovering");
            poisoned.into_inner()
        })
    }

    /// Ask the next run to hand unused device arena memory back to the
    /// allocator. No-op on CPU.
    pub(crate) fn request_arena_shrink(&self) {
        if self.device.is_accelerated() {
            self.shrink_pending.store(true, Ordering::Release);
        }
    }

    /// Run options for the next run, if an arena shrink is pending.
    #[cfg(feature = "cuda")]
    pub(crate) fn take_run_options(&self) -> Result<Option<ort::session::RunOptions>> {
        let Device::Cuda { device_id } = self.device else {
            return Ok(None);
        };
        if !self.shrink_pending.swap(false, Ordering::AcqRel) {
            return Ok(None);
        }
        let mut options = ort::session::RunOptions::new()
            .map_err(|e| BrevityError::Inference(format!("Failed to create run options: {}", e)))?;
        options
            .add_config_entry(
                "memory.enable_memory_arena_shrinkage",
                format!("gpu:{device_id}"),
            )
            .map_err(|e| {
                BrevityError::Inference(format!("Failed to request arena shrinkage: {}", e))
            })?;
        Ok(Some(options))
    }
}

/// Run a locked session, applying a pending arena shrink on CUDA builds.
macro_rules! run_session {
    ($onnx:expr, $session:expr, $inputs:expr) => {{
        #[cfg(feature = "cuda")]
        let outputs = match $onnx.take_run_options()? {
            Some(options) => $session.run_with_options($inputs, &options),
            None => $session.run($inputs),
        };
        #[cfg(not(feature = "cuda"))]
        let outputs = {
            let _ = &$onnx;
            $session.run($inputs)
        };
        outputs.map_err(|e| {
            $crate::error::BrevityError::Inference(format!("ONNX inference failed: {}", e))
        })
    }};
}

pub(crate) use run_session;

/// Copy an `f32` output tensor out of the session outputs.
///
/// Returns the shape and the row-major data.
pub(crate) fn extract_f32(value: Option<&DynValue>, name: &str) -> Result<(Vec<usize>, Vec<f32>)> {
    let value = value.ok_or_else(|| {
        BrevityError::UnexpectedOutput(format!("No {} output found", name))
    })?;

    // try_extract_tensor returns (&Shape, &[T])
    let (shape, data) = value.try_extract_tensor::<f32>().map_err(|e| {
        BrevityError::UnexpectedOutput(format!("Failed to extract {}: {}", name, e))
    })?;

    let dims = shape
        .iter()
        .map(|&d| {
            usize::try_from(d).map_err(|_| {
                BrevityError::UnexpectedOutput(format!("{} has dynamic dimension {}", name, d))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((dims, data.to_vec()))
}

/// Build an ONNX session with the appropriate execution provider.
fn build_session(model_path: &Path, device: &Device) -> Result<Session> {
    let builder = Session::builder()
        .map_err(|e| BrevityError::Configuration(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| BrevityError::Configuration(format!("Failed to set optimization level: {}", e)))?;

    // Configure execution provider based on device
    let builder = match device {
        Device::Cpu => builder,
        #[cfg(feature = "cuda")]
        Device::Cuda { device_id } => {
            use ort::execution_providers::CUDAExecutionProvider;
            builder
                .with_execution_providers([
                    CUDAExecutionProvider::default()
                        .with_device_id(*device_id as i32)
                        .build(),
                ])
                .map_err(|e| {
                    BrevityError::Configuration(format!("Failed to configure CUDA: {}", e))
                })?
        }
    };

    builder.commit_from_file(model_path).map_err(|e| {
        BrevityError::Configuration(format!(
            "Failed to load ONNX model {}: {}",
            model_path.display(),
            e
        ))
    })
}
