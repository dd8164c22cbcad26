//! Event handlers run on the worker thread.

use super::{DispatchStats, Event, Trigger};
use crate::capture::{Camera, FrameReader};
use crate::error::{AppError, Disposition, ErrorPolicy};
use crate::upload::{UploadOutcome, Uploader};
use std::sync::Arc;

/// Owns the camera and uploader and handles events for them.
pub struct Dispatcher {
    camera: Box<dyn Camera>,
    reader: FrameReader,
    uploader: Box<dyn Uploader>,
    policy: ErrorPolicy,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default error policy.
    pub fn new(camera: Box<dyn Camera>, reader: FrameReader, uploader: Box<dyn Uploader>) -> Self {
        Self {
            camera,
            reader,
            uploader,
            policy: ErrorPolicy::default(),
            stats: Arc::new(DispatchStats::new()),
        }
    }

    /// Replaces the error policy.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Records into shared counters instead of private ones.
    pub fn with_stats(mut self, stats: Arc<DispatchStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Counters this dispatcher records into.
    pub fn stats(&self) -> &Arc<DispatchStats> {
        &self.stats
    }

    /// Handles one event and routes any failure through the error policy.
    pub fn dispatch(&mut self, event: Event) -> Disposition {
        match self.handle(event) {
            Ok(()) => Disposition::Log,
            Err(error) => {
                self.stats.record_error();
                self.policy.handle(&error)
            }
        }
    }

    /// Handles one event, returning any failure to the caller.
    pub fn handle(&mut self, event: Event) -> Result<(), AppError> {
        match event {
            Event::ButtonEdge(trigger) => self.on_button_edge(trigger),
            Event::FrameReady => self.on_image_available(),
        }
    }

    /// Releases the camera. Called once when the worker exits.
    pub fn shutdown(&mut self) {
        self.camera.shutdown();
    }

    fn on_button_edge(&mut self, trigger: Trigger) -> Result<(), AppError> {
        self.stats.record_edge();
        match trigger {
            Trigger::Gpio => tracing::info!("GPIO changed, button pressed"),
            Trigger::Manual => tracing::info!("Manual capture requested"),
        }
        // No debounce: every edge is a capture request.
        self.camera.take_picture()?;
        self.stats.record_capture_request();
        Ok(())
    }

    fn on_image_available(&mut self) -> Result<(), AppError> {
        self.stats.record_frame();
        let image = match self.reader.acquire_latest() {
            Some(frame) => {
                let bytes = frame.first_plane().map(|plane| plane.bytes().to_vec());
                tracing::debug!(?frame, "Frame acquired");
                // Released before forwarding, whatever the upload does.
                drop(frame);
                bytes
            }
            None => None,
        };

        let outcome = self.uploader.upload(image.as_deref())?;
        if outcome == UploadOutcome::Missing {
            self.stats.record_missing_upload();
        }
        Ok(())
    }
}
