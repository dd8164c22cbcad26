//! Board-specific pin lookup.

use super::GpioError;
use std::fs;

const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";

/// Boards with a known button wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Board {
    /// Any Raspberry Pi model.
    RaspberryPi,
    /// NXP i.MX7D based boards.
    Imx7d,
    /// Anything else, with its device-tree model string.
    Unknown(String),
}

impl Board {
    /// Detects the board from the device-tree model string.
    pub fn detect() -> Self {
        match fs::read_to_string(DEVICE_TREE_MODEL) {
            Ok(model) => Self::from_model(&model),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read device-tree model");
                Self::Unknown(String::from("unknown"))
            }
        }
    }

    /// Maps a device-tree model string onto a board.
    pub fn from_model(model: &str) -> Self {
        // The kernel NUL-terminates the model property.
        let model = model.trim_end_matches('\0').trim();
        if model.starts_with("Raspberry Pi") {
            Board::RaspberryPi
        } else if model.contains("i.MX7") {
            Board::Imx7d
        } else {
            Board::Unknown(model.to_string())
        }
    }

    /// GPIO name the button is wired to on this board.
    pub fn button_gpio(&self) -> Result<&'static str, GpioError> {
        match self {
            Board::RaspberryPi => Ok("BCM21"),
            Board::Imx7d => Ok("GPIO6_IO14"),
            Board::Unknown(model) => Err(GpioError::UnknownBoard(model.clone())),
        }
    }
}

/// Parses a Broadcom pin name such as `BCM21` (or a bare `21`).
pub fn parse_bcm_pin(name: &str) -> Result<u8, GpioError> {
    let digits = name
        .strip_prefix("BCM")
        .or_else(|| name.strip_prefix("bcm"))
        .unwrap_or(name);
    match digits.parse::<u8>() {
        Ok(pin) if pin <= 53 => Ok(pin),
        _ => Err(GpioError::InvalidPin(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raspberry_pi_model() {
        let board = Board::from_model("Raspberry Pi 3 Model B Rev 1.2\0");
        assert_eq!(board, Board::RaspberryPi);
        assert_eq!(board.button_gpio().unwrap(), "BCM21");
    }

    #[test]
    fn test_imx7d_model() {
        let board = Board::from_model("NXP i.MX7 Dual PICO-PI-IMX7D");
        assert_eq!(board.button_gpio().unwrap(), "GPIO6_IO14");
    }

    #[test]
    fn test_unknown_board_has_no_button() {
        let board = Board::from_model("Generic x86");
        assert!(matches!(
            board.button_gpio(),
            Err(GpioError::UnknownBoard(_))
        ));
    }

    #[test]
    fn test_parse_bcm_pin() {
        assert_eq!(parse_bcm_pin("BCM21").unwrap(), 21);
        assert_eq!(parse_bcm_pin("4").unwrap(), 4);
        assert!(parse_bcm_pin("GPIO6_IO14").is_err());
        assert!(parse_bcm_pin("BCM99").is_err());
    }
}
