//! Camera abstraction for still capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.

use super::{CaptureConfig, Frame, FrameSink, Plane};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No device answered at the configured index.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device exists but its stream could not be opened.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The capture configuration was rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A capture request could not be served.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// `take_picture` was called before `initialize` or after `shutdown`.
    #[error("camera not initialized")]
    NotInitialized,
    /// The worker receiving frames has gone away.
    #[error("frame sink closed")]
    SinkClosed,
}

/// Trait for camera implementations.
///
/// Captures are asynchronous: `take_picture` only requests one, and the
/// completed frame arrives later through the [`FrameSink`] given to
/// `initialize`.
pub trait Camera: Send {
    /// Opens the device and binds the sink completed frames go to.
    fn initialize(&mut self, sink: FrameSink) -> Result<(), CameraError>;

    /// Requests a single still capture.
    fn take_picture(&mut self) -> Result<(), CameraError>;

    /// Releases the device. Further requests fail with `NotInitialized`.
    fn shutdown(&mut self);
}

/// Mock camera that delivers a synthetic frame for every request.
#[derive(Default)]
pub struct MockCamera {
    config: CaptureConfig,
    sink: Option<FrameSink>,
    sequence: u64,
    requests: Arc<AtomicUsize>,
    empty_frames: bool,
}

impl MockCamera {
    /// Creates a mock camera producing frames of the configured size.
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Delivers frames with no planes, so nothing can be read from them.
    pub fn with_empty_frames(mut self) -> Self {
        self.empty_frames = true;
        self
    }

    /// Shared count of `take_picture` calls, readable after the camera has
    /// been moved to the worker.
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }
}

impl Camera for MockCamera {
    fn initialize(&mut self, sink: FrameSink) -> Result<(), CameraError> {
        self.config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.sink = Some(sink);
        self.sequence = 0;
        tracing::info!("MockCamera initialized with config: {:?}", self.config);
        Ok(())
    }

    fn take_picture(&mut self) -> Result<(), CameraError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let sink = self.sink.as_ref().ok_or(CameraError::NotInitialized)?;

        self.sequence += 1;
        let (width, height) = (self.config.width, self.config.height);
        let planes = if self.empty_frames {
            Vec::new()
        } else {
            // Deterministic gradient, only for exercising frame handling.
            let pixels: Vec<u8> = (0..width as usize * height as usize)
                .map(|i| ((i as u64 ^ self.sequence) % 256) as u8)
                .collect();
            vec![Plane::new(pixels, width as usize, 1)]
        };
        sink.deliver(Frame::new(planes, width, height, self.sequence))
    }

    fn shutdown(&mut self) {
        self.sink = None;
        tracing::info!("MockCamera closed");
    }
}
