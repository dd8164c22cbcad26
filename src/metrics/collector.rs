//! Metrics collection and registry.

use crate::capture::CaptureCounter;
use crate::dispatch::DispatchStats;
use crate::lifecycle::Controller;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of system state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Button edges and manual triggers handled.
    pub button_edges: u64,
    /// Capture requests accepted by the camera.
    pub capture_requests: u64,
    /// Frames delivered by the camera.
    pub frames_delivered: u64,
    /// Image-ready events with nothing to upload.
    pub uploads_missing: u64,
    /// Errors handled by the error policy.
    pub errors: u64,
    /// Whether the worker thread is alive.
    pub worker_running: bool,
    /// Whether the button line is open.
    pub button_open: bool,
}

impl MetricsSnapshot {
    /// Reads the current counters. Liveness is left unset.
    pub fn from_components(stats: &DispatchStats, captures: &CaptureCounter) -> Self {
        Self {
            button_edges: stats.button_edges(),
            capture_requests: stats.capture_requests(),
            frames_delivered: captures.get(),
            uploads_missing: stats.uploads_missing(),
            errors: stats.errors(),
            ..Default::default()
        }
    }

    /// Reads counters and liveness from a controller.
    pub fn from_controller(controller: &Controller) -> Self {
        Self {
            worker_running: controller.worker_running(),
            button_open: controller.button_open(),
            ..Self::from_components(&controller.stats(), &controller.capture_counter())
        }
    }

    /// Liveness part of the snapshot.
    pub fn liveness(&self) -> Liveness {
        Liveness {
            worker_running: self.worker_running,
            button_open: self.button_open,
        }
    }
}

/// Whether the parts of the service that take pictures are up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Liveness {
    /// The worker thread is alive and handling events.
    pub worker_running: bool,
    /// The button line is open and has its callback registered.
    pub button_open: bool,
}

/// Prometheus metrics registry for the capture service.
pub struct MetricsRegistry {
    registry: Registry,
    button_edges: IntCounter,
    capture_requests: IntCounter,
    frames: IntCounter,
    uploads_missing: IntCounter,
    errors: IntCounter,
    worker_up: IntGauge,
    button_open: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all service metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let button_edges = IntCounter::new(
            "gpio_camera_button_edges_total",
            "Button edges and manual triggers handled",
        )?;
        let capture_requests = IntCounter::new(
            "gpio_camera_capture_requests_total",
            "Capture requests accepted by the camera",
        )?;
        let frames = IntCounter::new(
            "gpio_camera_frames_total",
            "Frames delivered by the camera",
        )?;
        let uploads_missing = IntCounter::new(
            "gpio_camera_uploads_missing_total",
            "Image-ready events with no image bytes",
        )?;
        let errors = IntCounter::new("gpio_camera_errors_total", "Errors handled")?;
        let worker_up = IntGauge::new("gpio_camera_worker_up", "1 while the worker runs")?;
        let button_open = IntGauge::new("gpio_camera_button_open", "1 while the button is open")?;

        registry.register(Box::new(button_edges.clone()))?;
        registry.register(Box::new(capture_requests.clone()))?;
        registry.register(Box::new(frames.clone()))?;
        registry.register(Box::new(uploads_missing.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(worker_up.clone()))?;
        registry.register(Box::new(button_open.clone()))?;

        Ok(Self {
            registry,
            button_edges,
            capture_requests,
            frames,
            uploads_missing,
            errors,
            worker_up,
            button_open,
        })
    }

    /// Updates all metrics from a snapshot of system state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward by the difference.
        advance(&self.button_edges, snapshot.button_edges);
        advance(&self.capture_requests, snapshot.capture_requests);
        advance(&self.frames, snapshot.frames_delivered);
        advance(&self.uploads_missing, snapshot.uploads_missing);
        advance(&self.errors, snapshot.errors);
        self.worker_up.set(i64::from(snapshot.worker_running));
        self.button_open.set(i64::from(snapshot.button_open));
    }

    /// Liveness as of the last update. Down until the first one.
    pub fn liveness(&self) -> Liveness {
        Liveness {
            worker_running: self.worker_up.get() == 1,
            button_open: self.button_open.get() == 1,
        }
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            button_edges: 5,
            capture_requests: 4,
            frames_delivered: 4,
            uploads_missing: 1,
            errors: 1,
            worker_running: true,
            button_open: false,
        };
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("gpio_camera_button_edges_total 5"));
        assert!(output.contains("gpio_camera_capture_requests_total 4"));
        assert!(output.contains("gpio_camera_uploads_missing_total 1"));
        assert!(output.contains("gpio_camera_worker_up 1"));
        assert!(output.contains("gpio_camera_button_open 0"));
    }

    #[test]
    fn test_liveness_follows_latest_update() {
        let registry = MetricsRegistry::new().unwrap();
        assert_eq!(registry.liveness(), Liveness::default());

        let up = MetricsSnapshot {
            worker_running: true,
            button_open: true,
            ..Default::default()
        };
        registry.update(&up);
        assert_eq!(registry.liveness(), up.liveness());

        registry.update(&MetricsSnapshot {
            button_open: true,
            ..Default::default()
        });
        assert!(!registry.liveness().worker_running);
    }

    #[test]
    fn test_counters_never_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&MetricsSnapshot {
            frames_delivered: 3,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            frames_delivered: 1,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("gpio_camera_frames_total 3"));
    }

    #[test]
    fn test_snapshot_from_components() {
        let stats = DispatchStats::new();
        stats.record_edge();
        stats.record_edge();
        stats.record_capture_request();
        let captures = CaptureCounter::new();
        captures.increment();

        let snapshot = MetricsSnapshot::from_components(&stats, &captures);
        assert_eq!(snapshot.button_edges, 2);
        assert_eq!(snapshot.capture_requests, 1);
        assert_eq!(snapshot.frames_delivered, 1);
        assert_eq!(snapshot.liveness(), Liveness::default());
    }
}
