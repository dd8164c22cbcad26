//! Prometheus metrics exporter for the capture service.
//!
//! # Metrics Exposed
//!
//! - `gpio_camera_button_edges_total` - Button edges and manual triggers handled
//! - `gpio_camera_capture_requests_total` - Capture requests accepted by the camera
//! - `gpio_camera_frames_total` - Frames delivered by the camera
//! - `gpio_camera_uploads_missing_total` - Image-ready events with no image bytes
//! - `gpio_camera_errors_total` - Errors handled by the error policy
//! - `gpio_camera_worker_up` - 1 while the worker thread runs
//! - `gpio_camera_button_open` - 1 while the button line is open
//!
//! # Example
//!
//! ```no_run
//! use gpio_camera::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     button_edges: 3,
//!     capture_requests: 3,
//!     frames_delivered: 2,
//!     uploads_missing: 0,
//!     errors: 1,
//!     worker_running: true,
//!     button_open: true,
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{Liveness, MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
