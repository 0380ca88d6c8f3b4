//! Impact force and score calculation for fall-ending collisions.
use serde::{Deserialize, Serialize};

use crate::config::TuningConfig;
use crate::numbers::{finite_f32_to_f64, floor_f64_to_u64, u64_to_f64};

/// `|v| * (height / height_scale)`.
#[must_use]
pub fn impact_force(relative_speed: f64, max_height: f64, height_scale: f64) -> f64 {
    relative_speed.abs() * (max_height / height_scale)
}

/// `floor(force * multiplier * (1 + height / divisor))`.
#[must_use]
pub fn impact_score(force: f64, stunt_multiplier: f64, max_height: f64, divisor: f64) -> u64 {
    floor_f64_to_u64(force * stunt_multiplier * (1.0 + max_height / divisor))
}

/// Impact force with the default height scale of 10.
#[must_use]
pub fn calculate_impact(relative_speed: f64, max_height: f64) -> f64 {
    let cfg = TuningConfig::default();
    impact_force(relative_speed, max_height, cfg.impact_height_scale)
}

/// Impact score with the default height divisor of 50.
#[must_use]
pub fn calculate_score(force: f64, stunt_multiplier: f64, max_height: f64) -> u64 {
    let cfg = TuningConfig::default();
    impact_score(force, stunt_multiplier, max_height, cfg.score_height_divisor)
}

/// Apply a level's score multiplier to a raw impact score.
#[must_use]
pub fn apply_level_multiplier(score: u64, level_multiplier: f64) -> u64 {
    floor_f64_to_u64(u64_to_f64(score) * level_multiplier)
}

/// Full breakdown of one scored impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub relative_speed: f64,
    pub max_height: f64,
    pub stunt_multiplier: f64,
    pub force: f64,
    pub score: u64,
}

impl ImpactReport {
    /// Score a collision using tuning parameters.
    #[must_use]
    pub fn compute(
        relative_speed: f32,
        max_height: f32,
        stunt_multiplier: f64,
        cfg: &TuningConfig,
    ) -> Self {
        let relative_speed = finite_f32_to_f64(relative_speed);
        let max_height = finite_f32_to_f64(max_height);
        let force = impact_force(relative_speed, max_height, cfg.impact_height_scale);
        let score = impact_score(
            force,
            stunt_multiplier,
            max_height,
            cfg.score_height_divisor,
        );
        Self {
            relative_speed,
            max_height,
            stunt_multiplier,
            force,
            score,
        }
    }
}
