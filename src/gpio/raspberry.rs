//! Raspberry Pi GPIO backend built on `rppal`.

use super::{
    parse_bcm_pin, Direction, EdgeCallback, EdgeEvent, EdgeTrigger, GpioError, GpioLine,
    PeripheralManager,
};
use rppal::gpio::{Gpio, InputPin, Pin, Trigger};

/// Opens BCM-numbered lines through `/dev/gpiomem`.
pub struct RppalPeripheralManager {
    pull_up: bool,
}

impl RppalPeripheralManager {
    /// Creates a manager. With `pull_up` set, inputs use the internal
    /// pull-up so an open button reads high and a press is a falling edge.
    pub fn new(pull_up: bool) -> Self {
        Self { pull_up }
    }
}

impl PeripheralManager for RppalPeripheralManager {
    fn open_gpio(&mut self, name: &str) -> Result<Box<dyn GpioLine>, GpioError> {
        let bcm = parse_bcm_pin(name)?;
        let open_err = |e: rppal::gpio::Error| GpioError::Open {
            pin: name.to_string(),
            reason: e.to_string(),
        };
        let pin = Gpio::new().map_err(open_err)?.get(bcm).map_err(open_err)?;
        tracing::info!(pin = name, bcm, "GPIO opened");
        Ok(Box::new(RppalLine {
            name: name.to_string(),
            pull_up: self.pull_up,
            state: LineState::Unconfigured(pin),
            trigger: Trigger::Disabled,
        }))
    }
}

enum LineState {
    Unconfigured(Pin),
    Input(InputPin),
    // Transitional while converting the pin.
    Taken,
}

struct RppalLine {
    name: String,
    pull_up: bool,
    state: LineState,
    trigger: Trigger,
}

impl GpioLine for RppalLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), GpioError> {
        if direction == Direction::Out {
            return Err(GpioError::Unsupported("output lines"));
        }
        self.state = match std::mem::replace(&mut self.state, LineState::Taken) {
            LineState::Unconfigured(pin) if self.pull_up => {
                LineState::Input(pin.into_input_pullup())
            }
            LineState::Unconfigured(pin) => LineState::Input(pin.into_input()),
            other => other,
        };
        Ok(())
    }

    fn set_edge_trigger(&mut self, trigger: EdgeTrigger) -> Result<(), GpioError> {
        if !matches!(self.state, LineState::Input(_)) {
            return Err(GpioError::NotInput(self.name.clone()));
        }
        self.trigger = match trigger {
            EdgeTrigger::None => Trigger::Disabled,
            EdgeTrigger::Rising => Trigger::RisingEdge,
            EdgeTrigger::Falling => Trigger::FallingEdge,
            EdgeTrigger::Both => Trigger::Both,
        };
        Ok(())
    }

    fn register_edge_callback(&mut self, mut callback: EdgeCallback) -> Result<(), GpioError> {
        let LineState::Input(input) = &mut self.state else {
            return Err(GpioError::NotInput(self.name.clone()));
        };
        let name = self.name.clone();
        let mut listening = true;
        // rppal cannot unregister from inside its own interrupt thread, so a
        // callback that asks to stop is simply not called again.
        input
            .set_async_interrupt(self.trigger, None, move |_event| {
                if listening {
                    listening = callback(&EdgeEvent::now(name.as_str()));
                }
            })
            .map_err(|e| GpioError::Config(e.to_string()))
    }

    fn close(self: Box<Self>) -> Result<(), GpioError> {
        let mut line = *self;
        if let LineState::Input(input) = &mut line.state {
            input
                .clear_async_interrupt()
                .map_err(|e| GpioError::Close(e.to_string()))?;
        }
        tracing::debug!(pin = %line.name, "GPIO released");
        Ok(())
    }
}
