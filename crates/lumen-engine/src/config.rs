//! Engine configuration loaded from JSON.
//!
//! Every field has a default, so a partial file only overrides what it
//! names:
//!
//! ```
//! use lumen_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "frame": { "headless": true } }"#).unwrap();
//! assert!(config.frame.headless);
//! assert_eq!(config.frame.max_delta, 0.05);
//! assert_eq!(config.input.stick_dead_zone, 8000);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game_loop::LoopConfig;
use crate::input::DeadZoneConfig;

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub frame: LoopConfig,
    pub input: DeadZoneConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_delta = self.frame.max_delta;
        if !(max_delta > 0.0 && max_delta.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "frame.max_delta must be positive and finite, got {max_delta}"
            )));
        }
        let input = &self.input;
        if input.trigger_dead_zone >= input.max_value {
            return Err(ConfigError::Invalid(format!(
                "input.trigger_dead_zone ({}) must be below input.max_value ({})",
                input.trigger_dead_zone, input.max_value
            )));
        }
        if input.stick_dead_zone >= input.max_value {
            return Err(ConfigError::Invalid(format!(
                "input.stick_dead_zone ({}) must be below input.max_value ({})",
                input.stick_dead_zone, input.max_value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        let err = EngineConfig::from_json_str(r#"{ "frame": { "max_delta": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");

        let err = EngineConfig::from_json_str(r#"{ "input": { "stick_dead_zone": 40000 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");

        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = EngineConfig::default();
        config.frame.min_frame_ms = 8;
        config.input.trigger_dead_zone = 500;
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
