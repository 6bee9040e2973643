//! Host capability checks.

use crate::error::{LiveUpdateError, Result};

/// Whether the host can show progress notifications at all.
pub trait CapabilityProbe: Send + Sync {
    fn supports_progress_notifications(&self) -> bool;
}

/// Probe with a fixed answer, for hosts that know their capabilities up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCapability(pub bool);

impl CapabilityProbe for FixedCapability {
    fn supports_progress_notifications(&self) -> bool {
        self.0
    }
}

/// Guard evaluated once before a live update starts.
pub fn ensure_supported(probe: &dyn CapabilityProbe) -> Result<()> {
    if probe.supports_progress_notifications() {
        Ok(())
    } else {
        Err(LiveUpdateError::Unsupported(
            "host cannot post progress notifications".to_string(),
        ))
    }
}
