//! Runtime tuning for combo timing, fall detection and scoring.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// How per-stunt multipliers combine within a single fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StackingRule {
    /// `1.0 + m1 + m2 + ...`
    #[default]
    Additive,
    /// `1.0 * (1 + m1) * (1 + m2) * ...`
    Multiplicative,
}

impl StackingRule {
    /// Fold a stunt bonus into the running multiplier.
    #[must_use]
    pub fn stack(self, current: f64, bonus: f64) -> f64 {
        match self {
            Self::Additive => current + bonus,
            Self::Multiplicative => current * (1.0 + bonus),
        }
    }
}

/// Errors raised when tuning invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("combo window must be greater than zero")]
    ZeroComboWindow,
    #[error("combo capacity must be between 1 and {max} (got {value})")]
    ComboCapacity { value: usize, max: usize },
    #[error("{field} must be positive (got {value:.2})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite and non-negative (got {value:.2})")]
    Negative { field: &'static str, value: f64 },
    #[error("invalid tuning json: {0}")]
    Parse(String),
}

/// Tunable parameters for the stunt and scoring core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    #[serde(default = "TuningConfig::default_combo_window_ms")]
    pub combo_window_ms: u64,
    #[serde(default = "TuningConfig::default_combo_capacity")]
    pub combo_capacity: usize,
    #[serde(default = "TuningConfig::default_fall_velocity_threshold")]
    pub fall_velocity_threshold: f32,
    #[serde(default = "TuningConfig::default_near_ground_threshold")]
    pub near_ground_threshold: f32,
    #[serde(default = "TuningConfig::default_ground_proximity_band")]
    pub ground_proximity_band: f32,
    /// Fall heights are reported in meters; positions arrive in world units.
    #[serde(default = "TuningConfig::default_height_units_per_meter")]
    pub height_units_per_meter: f32,
    #[serde(default = "TuningConfig::default_impact_height_scale")]
    pub impact_height_scale: f64,
    #[serde(default = "TuningConfig::default_score_height_divisor")]
    pub score_height_divisor: f64,
    #[serde(default = "TuningConfig::default_level_complete_delay_ms")]
    pub level_complete_delay_ms: u64,
    #[serde(default = "TuningConfig::default_score_easing_rate")]
    pub score_easing_rate: f32,
    #[serde(default)]
    pub stacking: StackingRule,
}

impl TuningConfig {
    const fn default_combo_window_ms() -> u64 {
        constants::COMBO_WINDOW_MS
    }

    const fn default_combo_capacity() -> usize {
        constants::COMBO_CAPACITY
    }

    const fn default_fall_velocity_threshold() -> f32 {
        constants::FALL_VELOCITY_THRESHOLD
    }

    const fn default_near_ground_threshold() -> f32 {
        constants::NEAR_GROUND_THRESHOLD
    }

    const fn default_ground_proximity_band() -> f32 {
        constants::GROUND_PROXIMITY_BAND
    }

    const fn default_height_units_per_meter() -> f32 {
        constants::HEIGHT_UNITS_PER_METER
    }

    const fn default_impact_height_scale() -> f64 {
        constants::IMPACT_HEIGHT_SCALE
    }

    const fn default_score_height_divisor() -> f64 {
        constants::SCORE_HEIGHT_DIVISOR
    }

    const fn default_level_complete_delay_ms() -> u64 {
        constants::LEVEL_COMPLETE_DELAY_MS
    }

    const fn default_score_easing_rate() -> f32 {
        constants::SCORE_EASING_RATE
    }

    /// Parse a tuning file and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check tuning invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combo_window_ms == 0 {
            return Err(ConfigError::ZeroComboWindow);
        }
        if self.combo_capacity == 0 || self.combo_capacity > constants::COMBO_CAPACITY {
            return Err(ConfigError::ComboCapacity {
                value: self.combo_capacity,
                max: constants::COMBO_CAPACITY,
            });
        }
        for (field, value) in [
            ("impact_height_scale", self.impact_height_scale),
            ("score_height_divisor", self.score_height_divisor),
            ("score_easing_rate", f64::from(self.score_easing_rate)),
            (
                "height_units_per_meter",
                f64::from(self.height_units_per_meter),
            ),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("fall_velocity_threshold", self.fall_velocity_threshold),
            ("near_ground_threshold", self.near_ground_threshold),
            ("ground_proximity_band", self.ground_proximity_band),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative {
                    field,
                    value: f64::from(value),
                });
            }
        }
        Ok(())
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            combo_window_ms: Self::default_combo_window_ms(),
            combo_capacity: Self::default_combo_capacity(),
            fall_velocity_threshold: Self::default_fall_velocity_threshold(),
            near_ground_threshold: Self::default_near_ground_threshold(),
            ground_proximity_band: Self::default_ground_proximity_band(),
            height_units_per_meter: Self::default_height_units_per_meter(),
            impact_height_scale: Self::default_impact_height_scale(),
            score_height_divisor: Self::default_score_height_divisor(),
            level_complete_delay_ms: Self::default_level_complete_delay_ms(),
            score_easing_rate: Self::default_score_easing_rate(),
            stacking: StackingRule::Additive,
        }
    }
}
