//! GPIO peripheral access.
//!
//! The button is read through a [`PeripheralManager`] that opens named
//! [`GpioLine`]s. A mock implementation is always available; the Raspberry
//! Pi backend is built with the `gpio` feature.

mod board;
mod line;
mod mock;
#[cfg(feature = "gpio")]
mod raspberry;

pub use board::{parse_bcm_pin, Board};
pub use line::{
    Direction, EdgeCallback, EdgeEvent, EdgeTrigger, GpioError, GpioLine, PeripheralManager,
};
pub use mock::{MockGpioHandle, MockPeripheralManager};
#[cfg(feature = "gpio")]
pub use raspberry::RppalPeripheralManager;
