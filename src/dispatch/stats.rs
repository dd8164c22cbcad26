//! Counters updated by the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals of dispatched work, shared between the worker and
/// whoever exports metrics.
#[derive(Debug, Default)]
pub struct DispatchStats {
    button_edges: AtomicU64,
    capture_requests: AtomicU64,
    frames: AtomicU64,
    uploads_missing: AtomicU64,
    errors: AtomicU64,
}

impl DispatchStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_edge(&self) {
        self.button_edges.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture_request(&self) {
        self.capture_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_missing_upload(&self) {
        self.uploads_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Button edges (and manual triggers) handled.
    pub fn button_edges(&self) -> u64 {
        self.button_edges.load(Ordering::Relaxed)
    }

    /// Capture requests accepted by the camera.
    pub fn capture_requests(&self) -> u64 {
        self.capture_requests.load(Ordering::Relaxed)
    }

    /// Image-ready events handled.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Image-ready events that had no bytes to forward.
    pub fn uploads_missing(&self) -> u64 {
        self.uploads_missing.load(Ordering::Relaxed)
    }

    /// Errors passed to the error policy.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}
