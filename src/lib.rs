//! GPIO Camera Library
//!
//! Push-button triggered still capture for embedded Linux boards. A falling
//! edge on the button's GPIO line requests a picture; the first plane of
//! each delivered frame is copied out and handed to an uploader.
//!
//! # Architecture
//!
//! ```text
//! lifecycle::Controller ── on_create / on_destroy
//!     │ opens                          │ starts
//!     ▼                                ▼
//! gpio line ──ButtonEdge──> dispatch::Worker ──take_picture──> capture::Camera
//!                               ▲    │                               │
//!                               │    └──> upload::Uploader           │
//!                               └──────────FrameReady────────────────┘
//! ```
//!
//! Every event is handled on the single worker thread. Failures travel as
//! values to [`error::ErrorPolicy`], which logs them and decides whether to
//! keep going.
//!
//! # Example
//!
//! ```no_run
//! use gpio_camera::{
//!     capture::{CaptureConfig, MockCamera},
//!     gpio::MockPeripheralManager,
//!     lifecycle::{Controller, StaticPermission},
//! };
//!
//! let peripherals = MockPeripheralManager::new();
//! let button = peripherals.handle();
//!
//! let mut controller = Controller::new(
//!     Box::new(StaticPermission::granted()),
//!     Box::new(peripherals),
//!     Box::new(MockCamera::new(CaptureConfig::default())),
//! )
//! .with_button_pin("BCM21");
//!
//! controller.on_create().unwrap();
//! button.fire_edge();
//! controller.on_destroy();
//! controller.join_worker().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gpio;
pub mod lifecycle;
pub mod metrics;
pub mod upload;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, Frame, FrameReader, MockCamera};
pub use config::FileConfig;
pub use dispatch::{Dispatcher, Event, Worker};
pub use error::{AppError, ErrorPolicy};
pub use gpio::{GpioLine, MockPeripheralManager, PeripheralManager};
pub use lifecycle::{Controller, Startup};
pub use upload::{LogUploader, Uploader};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
