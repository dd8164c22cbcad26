//! Background event dispatch.
//!
//! GPIO edges and camera completions never run application code on the
//! thread they arrive on. They are posted as typed [`Event`]s to a single
//! [`Worker`] thread, where a [`Dispatcher`] handles them one at a time.
//!
//! ```text
//! gpio interrupt ──ButtonEdge──┐
//!                              ├──> worker: Dispatcher ──> camera / uploader
//! camera capture ──FrameReady──┘
//! ```

mod event;
mod handlers;
mod stats;
mod worker;

pub(crate) use event::{event_channel, Message};
pub use event::{Event, EventSender, Trigger};
pub use handlers::Dispatcher;
pub use stats::DispatchStats;
pub use worker::{Worker, WorkerError};
