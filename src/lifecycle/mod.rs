//! Start/stop of the capture service.

mod controller;
mod permission;

pub use controller::{Controller, LifecycleError, Startup, WORKER_NAME};
pub use permission::{DevicePermission, PermissionChecker, StaticPermission};
