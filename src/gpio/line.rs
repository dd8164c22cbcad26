//! GPIO line abstraction.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the peripheral layer.
#[derive(Debug, Error)]
pub enum GpioError {
    /// The line could not be claimed.
    #[error("failed to open GPIO {pin}: {reason}")]
    Open {
        /// Name the line was requested by.
        pin: String,
        /// Backend failure message.
        reason: String,
    },
    /// The name does not map to a line on this board.
    #[error("invalid GPIO pin name: {0}")]
    InvalidPin(String),
    /// No pin was configured and the board has no known button line.
    #[error("no button GPIO known for board {0}")]
    UnknownBoard(String),
    /// Edge detection was requested on a line not set to input.
    #[error("GPIO {0} must be configured as input first")]
    NotInput(String),
    /// The backend cannot do what was asked.
    #[error("unsupported GPIO operation: {0}")]
    Unsupported(&'static str),
    /// The backend rejected a direction, trigger or callback change.
    #[error("failed to configure GPIO: {0}")]
    Config(String),
    /// Releasing the line failed. The handle is gone either way.
    #[error("failed to close GPIO: {0}")]
    Close(String),
}

/// Signal direction of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input, read by the application.
    In,
    /// Output, driven by the application.
    Out,
}

/// Which signal transitions fire the edge callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    /// No edges fire the callback.
    None,
    /// Low to high.
    Rising,
    /// High to low, i.e. a press on a pulled-up button.
    Falling,
    /// Either transition.
    Both,
}

/// A single observed transition on a line.
#[derive(Debug, Clone)]
pub struct EdgeEvent {
    /// Name of the line the edge was seen on.
    pub pin: String,
    /// When the edge was observed.
    pub at: DateTime<Utc>,
}

impl EdgeEvent {
    /// Creates an edge event stamped with the current time.
    pub fn now(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            at: Utc::now(),
        }
    }
}

/// Edge callback. Return `true` to keep listening, `false` to unregister.
pub type EdgeCallback = Box<dyn FnMut(&EdgeEvent) -> bool + Send>;

/// An open digital line.
pub trait GpioLine: Send {
    /// The name the line was opened with.
    fn name(&self) -> &str;

    /// Sets the line direction.
    fn set_direction(&mut self, direction: Direction) -> Result<(), GpioError>;

    /// Selects which edges fire the registered callback.
    fn set_edge_trigger(&mut self, trigger: EdgeTrigger) -> Result<(), GpioError>;

    /// Registers the edge callback, replacing any previous one.
    fn register_edge_callback(&mut self, callback: EdgeCallback) -> Result<(), GpioError>;

    /// Releases the line. Consumes the handle so it cannot be closed twice.
    fn close(self: Box<Self>) -> Result<(), GpioError>;
}

/// Opens GPIO lines by name.
pub trait PeripheralManager: Send {
    /// Opens the named line.
    fn open_gpio(&mut self, name: &str) -> Result<Box<dyn GpioLine>, GpioError>;
}
