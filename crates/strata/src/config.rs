//! # Engine Configuration
//!
//! Loaded once at startup. Every field has a default, so a TOML document
//! only needs to name what it overrides:
//!
//! ```toml
//! player_height = 1.6
//! tick_rate = 50
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_shared::{Vec3, MAX_RAY_DISTANCE};

use crate::error::{ConfigError, ConfigResult};

/// Engine construction options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Player box height.
    pub player_height: f32,
    /// Player box width (x and z).
    pub player_width: f32,
    /// Bottom-center spawn position of the player.
    pub player_start: Vec3,
    /// Whether the player body steps up onto one-block ledges.
    pub player_auto_step: bool,
    /// Fixed simulation step length in milliseconds.
    pub tick_rate: f32,
    /// Maximum reach of the block targeter.
    pub block_test_distance: f32,
    /// Disables the built-in highlight of the targeted block face.
    pub skip_default_highlighting: bool,
    /// Capacity of each engine event subscriber channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            player_height: 1.8,
            player_width: 0.6,
            player_start: Vec3::new(0.0, 10.0, 0.0),
            player_auto_step: false,
            tick_rate: 30.0,
            block_test_distance: 10.0,
            skip_default_highlighting: false,
            event_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) TOML document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        positive("player_height", self.player_height)?;
        positive("player_width", self.player_width)?;
        positive("tick_rate", self.tick_rate)?;
        if !self.player_start.is_finite() {
            return Err(ConfigError::Invalid("player_start must be finite".into()));
        }
        if !(0.0..=MAX_RAY_DISTANCE).contains(&self.block_test_distance) {
            return Err(ConfigError::Invalid(format!(
                "block_test_distance must be between 0 and {MAX_RAY_DISTANCE}, got {}",
                self.block_test_distance
            )));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Height of the eye above the player's feet.
    #[must_use]
    pub fn eye_offset(&self) -> f32 {
        0.9 * self.player_height
    }
}

fn positive(field: &str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be a finite positive number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.player_start, Vec3::new(0.0, 10.0, 0.0));
        assert!((config.tick_rate - 30.0).abs() < f32::EPSILON);
        assert!((config.eye_offset() - 1.62).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config = EngineConfig::from_toml_str(
            "player_height = 2.0\nplayer_start = [1.0, 2.0, 3.0]\nskip_default_highlighting = true\n",
        )
        .unwrap();

        assert!((config.player_height - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.player_start, Vec3::new(1.0, 2.0, 3.0));
        assert!(config.skip_default_highlighting);
        assert!((config.player_width - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.event_capacity, 1024);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("tick_rate = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_toml_str("block_test_distance = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_block_test_distance_beyond_ray_limit_rejected() {
        let err = EngineConfig::from_toml_str("block_test_distance = 1e9").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = EngineConfig::from_toml_str("block_test_distance = 4096.0").unwrap();
        assert!((config.block_test_distance - MAX_RAY_DISTANCE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("player_height = \"tall\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
