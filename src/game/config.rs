//! Match Configuration
//!
//! Sources, lowest to highest precedence: `Default`, a JSON document,
//! then `BRAWL_*` environment overrides.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::profile::GENERIC_ARCHETYPE;
use crate::game::stage::StageLayout;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON document could not be parsed.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// An environment override could not be interpreted.
    #[error("Invalid value '{value}' for {var}")]
    Env {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },
}

/// Input mapping configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Analog stick deadzone applied to each axis
    pub deadzone: f32,
    /// A jump released within this many ticks is a short hop
    pub short_hop_max_ticks: u64,
    /// A jump press held longer than this without release is discarded
    pub stale_press_ticks: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.15,
            short_hop_max_ticks: 7,
            stale_press_ticks: 20,
        }
    }
}

/// When the stage tilts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TiltMode {
    /// Stage never tilts
    Off,
    /// Oscillates between the angle bounds for the whole match
    Continuous,
    /// One-shot tilt event every `interval_ticks`
    Periodic {
        /// Ticks between event starts
        interval_ticks: u64,
    },
}

/// Stage tilt configuration. Angles are in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Scheduling mode
    pub mode: TiltMode,
    /// Lower oscillation bound
    pub min_angle: f32,
    /// Upper oscillation bound
    pub max_angle: f32,
    /// Degrees per tick while oscillating
    pub oscillation_speed: f32,
    /// Cap of a one-shot event
    pub event_max_angle: f32,
    /// Degrees per tick while a one-shot event ramps
    pub event_ramp_speed: f32,
    /// Length of a one-shot event
    pub event_duration_ticks: u64,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            mode: TiltMode::Off,
            min_angle: -15.0,
            max_angle: 15.0,
            oscillation_speed: 0.1,
            event_max_angle: 20.0,
            event_ramp_speed: 0.25,
            event_duration_ticks: 300,
        }
    }
}

/// Default interval used when periodic tilt is enabled from the environment.
pub const DEFAULT_TILT_INTERVAL_TICKS: u64 = 900;

/// Complete match configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Input mapping
    pub input: InputConfig,
    /// Stage tilt
    pub tilt: TiltConfig,
    /// Stage layout
    pub layout: StageLayout,
    /// Archetype key per player, in player order
    pub archetypes: Vec<String>,
    /// Distance past the stage bounds where a character is KO'd
    pub blast_margin: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            tilt: TiltConfig::default(),
            layout: StageLayout::Battlefield,
            archetypes: vec![GENERIC_ARCHETYPE.to_string(), GENERIC_ARCHETYPE.to_string()],
            blast_margin: 400.0,
        }
    }
}

impl MatchConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BRAWL_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BRAWL_DEADZONE") {
            self.input.deadzone = value.trim().parse().map_err(|_| ConfigError::Env {
                var: "BRAWL_DEADZONE".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("BRAWL_TILT_MODE") {
            self.tilt.mode = match value.trim().to_ascii_lowercase().as_str() {
                "off" => TiltMode::Off,
                "continuous" => TiltMode::Continuous,
                "periodic" => TiltMode::Periodic {
                    interval_ticks: DEFAULT_TILT_INTERVAL_TICKS,
                },
                _ => {
                    return Err(ConfigError::Env {
                        var: "BRAWL_TILT_MODE".to_string(),
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup("BRAWL_LAYOUT") {
            self.layout = StageLayout::from_key(value.trim()).ok_or_else(|| ConfigError::Env {
                var: "BRAWL_LAYOUT".to_string(),
                value: value.clone(),
            })?;
        }

        self.validate()
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.input.deadzone) {
            return Err(ConfigError::Invalid(format!(
                "deadzone {} must be in [0, 1)",
                self.input.deadzone
            )));
        }
        if self.input.short_hop_max_ticks >= self.input.stale_press_ticks {
            return Err(ConfigError::Invalid(
                "short_hop_max_ticks must be below stale_press_ticks".to_string(),
            ));
        }
        if self.tilt.min_angle > self.tilt.max_angle {
            return Err(ConfigError::Invalid(format!(
                "tilt min_angle {} exceeds max_angle {}",
                self.tilt.min_angle, self.tilt.max_angle
            )));
        }
        if self.tilt.oscillation_speed <= 0.0 || self.tilt.event_ramp_speed <= 0.0 {
            return Err(ConfigError::Invalid("tilt speeds must be positive".to_string()));
        }
        if let TiltMode::Periodic { interval_ticks } = self.tilt.mode {
            if interval_ticks <= self.tilt.event_duration_ticks {
                return Err(ConfigError::Invalid(
                    "tilt interval must be longer than the event duration".to_string(),
                ));
            }
        }
        if self.archetypes.len() != crate::PLAYER_COUNT {
            return Err(ConfigError::Invalid(format!(
                "expected {} archetypes, got {}",
                crate::PLAYER_COUNT,
                self.archetypes.len()
            )));
        }
        if self.blast_margin <= 0.0 {
            return Err(ConfigError::Invalid("blast_margin must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MatchConfig::from_json_str(
            r#"{ "input": { "deadzone": 0.25 }, "tilt": { "mode": { "kind": "continuous" } } }"#,
        )
        .unwrap();
        assert_eq!(config.input.deadzone, 0.25);
        assert_eq!(config.input.short_hop_max_ticks, 7);
        assert_eq!(config.tilt.mode, TiltMode::Continuous);
        assert_eq!(config.tilt.max_angle, 15.0);
        assert_eq!(config.layout, StageLayout::Battlefield);
    }

    #[test]
    fn test_json_periodic_mode() {
        let config = MatchConfig::from_json_str(
            r#"{ "tilt": { "mode": { "kind": "periodic", "interval_ticks": 600 } } }"#,
        )
        .unwrap();
        assert_eq!(config.tilt.mode, TiltMode::Periodic { interval_ticks: 600 });
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let result = MatchConfig::from_json_str(r#"{ "tilt": { "min_angle": 10.0, "max_angle": -10.0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(MatchConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: BTreeMap<&str, &str> = [
            ("BRAWL_DEADZONE", "0.2"),
            ("BRAWL_TILT_MODE", "periodic"),
            ("BRAWL_LAYOUT", "final_destination"),
        ]
        .into_iter()
        .collect();

        let mut config = MatchConfig::default();
        config
            .apply_overrides(|var| vars.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.input.deadzone, 0.2);
        assert_eq!(
            config.tilt.mode,
            TiltMode::Periodic { interval_ticks: DEFAULT_TILT_INTERVAL_TICKS }
        );
        assert_eq!(config.layout, StageLayout::FinalDestination);
    }

    #[test]
    fn test_bad_override_reports_variable() {
        let mut config = MatchConfig::default();
        let err = config
            .apply_overrides(|var| (var == "BRAWL_TILT_MODE").then(|| "sideways".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref var, .. } if var == "BRAWL_TILT_MODE"));
    }
}
