//! Configuration
//!
//! Simulation constants and per-session options, loadable from JSON.
//! Every field has a default so partial files are fine.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Errors loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was opened
        path: String,
        /// Underlying read failure
        #[source]
        source: std::io::Error,
    },

    /// File is not valid config JSON
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Seeds, timings and platform timeouts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Session seed; subsystems derive their own streams from it
    pub seed: u64,
    /// Length of a round (ms)
    pub round_duration_ms: f64,
    /// Rounds per session
    pub total_rounds: u32,
    /// Fixed simulation slice (ms)
    pub fixed_step_ms: f64,
    /// Catch-up cap per update call
    pub max_steps_per_frame: u32,
    /// Frame deltas are clamped to `[0, max_frame_delta_ms]`
    pub max_frame_delta_ms: f64,
    /// Visual flash after a contact tag (ms)
    pub tag_flash_ms: f64,
    /// Platform init timeout (ms)
    pub platform_init_timeout_ms: u64,
    /// Mid-session ad timeout (ms)
    pub ad_timeout_ms: u64,
    /// Profile storage timeout (ms)
    pub storage_timeout_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 444,
            round_duration_ms: 90_000.0,
            total_rounds: 3,
            fixed_step_ms: 1000.0 / 120.0,
            max_steps_per_frame: 12,
            max_frame_delta_ms: 100.0,
            tag_flash_ms: 160.0,
            platform_init_timeout_ms: 1200,
            ad_timeout_ms: 30_000,
            storage_timeout_ms: 2000,
        }
    }
}

impl SimulationConfig {
    /// Seed of the power-up stream.
    pub fn powerup_seed(&self) -> u64 {
        self.seed.wrapping_add(1)
    }

    /// Seed of the ghost's generator (31 bits are used).
    pub fn ghost_seed(&self) -> u32 {
        (self.seed.wrapping_add(2) & 0x7fff_ffff) as u32
    }

    /// Seed of the map rotation stream.
    pub fn map_seed(&self) -> u64 {
        self.seed.wrapping_add(3)
    }

    /// Reject values the fixed-step loop cannot run with.
    ///
    /// Durations must be finite; the step, round and frame clamp must also be
    /// positive. A zero step cap or zero rounds would stall the session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("fixed_step_ms", self.fixed_step_ms)?;
        positive("round_duration_ms", self.round_duration_ms)?;
        positive("max_frame_delta_ms", self.max_frame_delta_ms)?;
        if !self.tag_flash_ms.is_finite() || self.tag_flash_ms < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tag_flash_ms must be finite and non-negative, got {}",
                self.tag_flash_ms
            )));
        }
        if self.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid("max_steps_per_frame must be at least 1".into()));
        }
        if self.total_rounds == 0 {
            return Err(ConfigError::Invalid("total_rounds must be at least 1".into()));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be finite and positive, got {value}")))
    }
}

/// Options chosen when a session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Fill an empty seat with the ghost
    pub ghost_enabled: bool,
    /// Spawn and allow power-ups
    pub powerups_enabled: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ghost_enabled: true,
            powerups_enabled: true,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation constants
    pub simulation: SimulationConfig,
    /// Session options
    pub session: SessionOptions,
}

impl GameConfig {
    /// Parse from a JSON string and validate the simulation values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.simulation.seed, 444);
        assert_eq!(config.simulation.powerup_seed(), 445);
        assert_eq!(config.simulation.ghost_seed(), 446);
        assert_eq!(config.simulation.map_seed(), 447);
        assert_eq!(config.simulation.max_steps_per_frame, 12);
        assert!(config.session.ghost_enabled && config.session.powerups_enabled);
    }

    #[test]
    fn test_partial_json() {
        let config = GameConfig::from_json_str(
            r#"{ "simulation": { "seed": 7, "total_rounds": 1 }, "session": { "ghost_enabled": false } }"#,
        )
        .unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.total_rounds, 1);
        assert_eq!(config.simulation.round_duration_ms, 90_000.0);
        assert!(!config.session.ghost_enabled);
        assert!(config.session.powerups_enabled);

        assert_eq!(GameConfig::from_json_str("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(GameConfig::from_json_str("[1, 2]"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            GameConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let cases = [
            r#"{ "simulation": { "fixed_step_ms": 0 } }"#,
            r#"{ "simulation": { "fixed_step_ms": -8.3 } }"#,
            r#"{ "simulation": { "max_steps_per_frame": 0 } }"#,
            r#"{ "simulation": { "round_duration_ms": 0 } }"#,
            r#"{ "simulation": { "round_duration_ms": -1000 } }"#,
            r#"{ "simulation": { "max_frame_delta_ms": 0 } }"#,
            r#"{ "simulation": { "total_rounds": 0 } }"#,
            r#"{ "simulation": { "tag_flash_ms": -1 } }"#,
        ];
        for json in cases {
            assert!(
                matches!(GameConfig::from_json_str(json), Err(ConfigError::Invalid(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let config = SimulationConfig {
            fixed_step_ms: f64::NAN,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SimulationConfig {
            round_duration_ms: f64::INFINITY,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SimulationConfig {
            tag_flash_ms: 0.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(SimulationConfig::default().validate().is_ok());
    }
}
