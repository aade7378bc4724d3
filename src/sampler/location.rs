//! Best-effort location fixes for payload context enrichment.

use crate::sampler::types::LocationFix;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Errors raised by a location capability.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Positioning unavailable: {0}")]
    Unavailable(String),

    #[error("Position fix timed out")]
    Timeout,
}

/// Access to the device positioning stack.
pub trait LocationCapability: Send + Sync {
    fn request_permission(&self) -> PermissionStatus;
    fn current_position(&self) -> Result<LocationFix, LocationError>;
}

/// Requests one current position fix on demand.
///
/// Location is an enrichment of payload context, never a gating condition:
/// every failure path degrades to `None` and the caller proceeds without it.
#[derive(Clone)]
pub struct LocationProbe {
    capability: Arc<dyn LocationCapability>,
}

impl LocationProbe {
    pub fn new(capability: Arc<dyn LocationCapability>) -> Self {
        Self { capability }
    }

    /// Request permission if needed and return one fix, or `None` on
    /// denial/failure. Never returns an error.
    pub fn get_location(&self) -> Option<LocationFix> {
        if self.capability.request_permission() != PermissionStatus::Granted {
            tracing::debug!("location permission denied, proceeding without fix");
            return None;
        }

        match self.capability.current_position() {
            Ok(fix) => Some(fix),
            Err(e) => {
                tracing::warn!("location fix failed: {e}");
                None
            }
        }
    }
}

/// Capability for hosts without a positioning stack: permission always denied.
pub struct DeniedLocationCapability;

impl LocationCapability for DeniedLocationCapability {
    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }

    fn current_position(&self) -> Result<LocationFix, LocationError> {
        Err(LocationError::Unavailable("no positioning stack".to_string()))
    }
}

/// Capability returning a constant fix. Used by the CLI demo commands.
pub struct FixedLocationCapability {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationCapability {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl LocationCapability for FixedLocationCapability {
    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn current_position(&self) -> Result<LocationFix, LocationError> {
        Ok(LocationFix::new(self.latitude, self.longitude))
    }
}
