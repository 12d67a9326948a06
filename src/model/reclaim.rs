//! Memory reclamation between inference calls.
//!
//! A long-lived process running many sequential generations accumulates
//! freed-but-retained memory in two places: the host allocator's free lists
//! and the execution provider's device arena. The reclaimer returns both to
//! their owners before each inference. Failures are logged and swallowed.

use tracing::debug;

use super::Device;
use crate::providers::DeviceCache;
use crate::telemetry;

/// Releases transient allocator state before an inference call.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReclaimer {
    device: Device,
}

impl MemoryReclaimer {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Trim the host heap and, on an accelerator, ask `cache` to release its
    /// unused device memory.
    pub fn reclaim<C: DeviceCache + ?Sized>(&self, cache: &C) {
        let trimmed = trim_host_heap();

        if self.device.is_accelerated() {
            if let Err(e) = cache.release_cached_memory() {
                debug!(device = self.device.name(), error = %e, "device cache release failed");
            }
        }

        debug!(device = self.device.name(), host_trimmed = trimmed, "memory reclaimed");
        metrics::counter!(telemetry::MEMORY_RECLAIMS_TOTAL, "device" => self.device.name())
            .increment(1);
    }
}

/// Return free heap pages to the OS. Returns whether anything was released.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn trim_host_heap() -> bool {
    // SAFETY: malloc_trim only walks glibc's own arenas.
    unsafe { libc::malloc_trim(0) == 1 }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn trim_host_heap() -> bool {
    false
}
