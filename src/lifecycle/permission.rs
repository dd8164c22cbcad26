//! Camera access checks.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Decides whether the process may use the camera.
pub trait PermissionChecker: Send {
    /// Whether camera access is currently granted.
    fn check_camera(&self) -> bool;

    /// Asks for camera access. The answer, if any, arrives later through
    /// `Controller::on_request_permissions_result`.
    fn request_camera(&mut self);
}

/// Grants access when the camera device node can be opened for reading.
#[derive(Debug, Clone)]
pub struct DevicePermission {
    device: PathBuf,
}

impl DevicePermission {
    /// Checks access to the given device node.
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl PermissionChecker for DevicePermission {
    fn check_camera(&self) -> bool {
        match OpenOptions::new().read(true).open(&self.device) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    device = %self.device.display(),
                    error = %e,
                    "Camera not accessible"
                );
                false
            }
        }
    }

    fn request_camera(&mut self) {
        // There is no interactive grant on Linux; the operator has to fix
        // device permissions and restart.
        tracing::warn!(
            device = %self.device.display(),
            "Camera access required: add this user to the group owning the device"
        );
    }
}

/// Fixed answer, for simulation and tests.
#[derive(Debug, Clone)]
pub struct StaticPermission {
    granted: bool,
    requests: Arc<AtomicUsize>,
}

impl StaticPermission {
    /// Always grants access.
    pub fn granted() -> Self {
        Self {
            granted: true,
            requests: Arc::default(),
        }
    }

    /// Always denies access.
    pub fn denied() -> Self {
        Self {
            granted: false,
            requests: Arc::default(),
        }
    }

    /// Shared count of `request_camera` calls.
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }
}

impl PermissionChecker for StaticPermission {
    fn check_camera(&self) -> bool {
        self.granted
    }

    fn request_camera(&mut self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
