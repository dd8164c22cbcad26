//! Camera collaborator and frame handling.
//!
//! A [`Camera`] is handed a [`FrameSink`] at initialization. Each completed
//! capture is pushed through the sink, which queues the frame on a shared
//! [`FrameReader`] and posts a `FrameReady` event to the worker. The worker
//! then acquires the latest frame from the reader.

mod camera;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod sink;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::{CaptureConfig, MAX_DIMENSION};
pub use frame::{Frame, FrameReader, Plane};
#[cfg(feature = "camera")]
pub use native::NokhwaCamera;
pub use sink::{CaptureCounter, FrameSink};
