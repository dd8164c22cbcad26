//! Configuration file format.

use crate::capture::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero or above the supported maximum.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1-120 fps.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// `max_frames` is zero.
    #[error("frame reader must hold at least one frame")]
    InvalidMaxFrames,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub button: ButtonConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Button wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    /// GPIO name; the board default is used when unset.
    pub pin: Option<String>,
    /// Enable the internal pull-up on the button input.
    pub pull_up: bool,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pin: None,
            pull_up: true,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { port: 9090 }
    }
}

impl FileConfig {
    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert!(config.button.pin.is_none());
        assert!(config.button.pull_up);
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.metrics.port, 9090);
    }

    #[test]
    fn test_partial_sections() {
        let config = FileConfig::from_toml(
            r#"
            [button]
            pin = "BCM17"

            [capture]
            device_id = 1
            width = 1280
            height = 720

            [metrics]
            port = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.button.pin.as_deref(), Some("BCM17"));
        assert!(config.button.pull_up);
        assert_eq!(config.capture.device_id, 1);
        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.metrics.port, 0);
    }

    #[test]
    fn test_shipped_example_parses() {
        let config = FileConfig::from_toml(include_str!("../gpio-camera.toml")).unwrap();
        assert!(config.button.pin.is_none());
        assert_eq!(config.capture.max_frames, 2);
    }

    #[test]
    fn test_invalid_capture_rejected() {
        let result = FileConfig::from_toml("[capture]\nfps = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidFrameRate)));
    }

    #[test]
    fn test_malformed_toml() {
        let result = FileConfig::from_toml("[button\npin = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
