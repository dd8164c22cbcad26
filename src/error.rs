//! Application-wide error type and the policy that decides what to do
//! with a failure.
//!
//! Component modules return their own `thiserror` enums. Anything that
//! reaches the top of a callback path is converted into [`AppError`] and
//! handed to a single [`ErrorPolicy`], which logs it and returns a
//! [`Disposition`]. No component decides on its own whether a failure is
//! fatal.

use crate::capture::CameraError;
use crate::config::ConfigError;
use crate::dispatch::WorkerError;
use crate::gpio::GpioError;
use crate::lifecycle::LifecycleError;
use crate::upload::UploadError;
use thiserror::Error;

/// Any failure surfaced by the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Button line failure.
    #[error("peripheral I/O error: {0}")]
    Gpio(#[from] GpioError),
    /// Camera failure.
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    /// Uploader failure.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// Worker thread failure.
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),
    /// Controller misuse or failed start.
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// What the caller should do after an error has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The error was logged; carry on.
    Log,
    /// Stop the current processing loop.
    Halt,
}

/// Central log-vs-halt decision.
///
/// The default policy halts when events can no longer reach the worker
/// (its channel or a camera's frame sink is closed, or it panicked) and on
/// configuration or lifecycle failures, which leave nothing to run.
/// Peripheral, camera and upload failures are logged and swallowed.
/// [`ErrorPolicy::strict`] halts on every error; the binary uses it during
/// startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorPolicy {
    strict: bool,
}

impl ErrorPolicy {
    /// Policy that halts on any error.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Classifies an error without logging it.
    pub fn decide(&self, error: &AppError) -> Disposition {
        if self.strict {
            return Disposition::Halt;
        }
        match error {
            AppError::Worker(WorkerError::Disconnected | WorkerError::Panicked)
            | AppError::Camera(CameraError::SinkClosed)
            | AppError::Config(_)
            | AppError::Lifecycle(_) => Disposition::Halt,
            _ => Disposition::Log,
        }
    }

    /// Logs the error and returns the decision for it.
    pub fn handle(&self, error: &AppError) -> Disposition {
        let disposition = self.decide(error);
        match error {
            AppError::Gpio(_) => {
                tracing::error!(error = %error, "Error on peripheral I/O");
            }
            _ => {
                tracing::error!(error = %error, ?disposition, "Operation failed");
            }
        }
        disposition
    }
}
