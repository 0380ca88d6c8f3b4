//! Fall-state tracking: airborne detection, height accumulation and landing resets.
use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::TuningConfig;
use crate::constants::BASE_STUNT_MULTIPLIER;
use crate::impact::ImpactReport;
use crate::physics::{BodyPart, PhysicsBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallPhase {
    #[default]
    Grounded,
    Airborne,
}

/// Per-tick observation of the character fed to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySample {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Distance to the nearest supporting surface below the character.
    pub ground_clearance: f32,
    pub timestamp_ms: u64,
}

impl BodySample {
    /// Sample the torso through the physics backend.
    #[must_use]
    pub fn from_backend(physics: &dyn PhysicsBackend, timestamp_ms: u64) -> Option<Self> {
        let torso = physics.body_state(BodyPart::Torso)?;
        Some(Self {
            position: torso.position,
            velocity: torso.velocity,
            ground_clearance: physics.ground_clearance(),
            timestamp_ms,
        })
    }
}

/// Everything scoring needs from a finished fall, captured before the reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallSummary {
    pub max_height: f32,
    pub duration_ms: u64,
    pub performed_stunts: Vec<String>,
    pub stunt_multiplier: f64,
    /// Force of the scored impact, zero when the fall ended without one.
    pub impact_force: f64,
}

/// Phase change produced by [`FallState::observe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FallTransition {
    Started { origin_y: f32, timestamp_ms: u64 },
    Landed(FallSummary),
}

/// Fall bookkeeping owned by the character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallState {
    pub phase: FallPhase,
    pub fall_start_ms: u64,
    pub fall_origin_y: f32,
    /// Meters fallen since `fall_origin_y`.
    pub current_height: f32,
    pub max_height_this_fall: f32,
    /// Names in the order performed; never contains duplicates.
    pub performed_stunts: Vec<String>,
    pub stunt_multiplier: f64,
    pub impact_force: f64,
    pub hit_impact_surface: bool,
    /// Set while a stunt animation is playing; cleared on landing.
    pub stunting: bool,
}

impl Default for FallState {
    fn default() -> Self {
        Self {
            phase: FallPhase::Grounded,
            fall_start_ms: 0,
            fall_origin_y: 0.0,
            current_height: 0.0,
            max_height_this_fall: 0.0,
            performed_stunts: Vec::new(),
            stunt_multiplier: BASE_STUNT_MULTIPLIER,
            impact_force: 0.0,
            hit_impact_surface: false,
            stunting: false,
        }
    }
}

impl FallState {
    #[must_use]
    pub fn is_airborne(&self) -> bool {
        self.phase == FallPhase::Airborne
    }

    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.phase == FallPhase::Grounded
    }

    #[must_use]
    pub fn has_performed(&self, name: &str) -> bool {
        self.performed_stunts.iter().any(|performed| performed == name)
    }

    /// Record a performed stunt together with the fall multiplier it produced.
    pub fn record_stunt(&mut self, name: &str, stunt_multiplier: f64) {
        if self.has_performed(name) {
            return;
        }
        self.performed_stunts.push(name.to_string());
        self.stunt_multiplier = stunt_multiplier;
        self.stunting = true;
    }

    /// Enter the airborne phase from `origin_y`.
    pub fn begin_fall(&mut self, timestamp_ms: u64, origin_y: f32) {
        self.phase = FallPhase::Airborne;
        self.fall_start_ms = timestamp_ms;
        self.fall_origin_y = origin_y;
        self.current_height = 0.0;
    }

    /// Return to the grounded phase, clearing everything scoped to the fall.
    pub fn land(&mut self) {
        self.phase = FallPhase::Grounded;
        self.performed_stunts.clear();
        self.stunt_multiplier = BASE_STUNT_MULTIPLIER;
        self.max_height_this_fall = 0.0;
        self.current_height = 0.0;
        self.impact_force = 0.0;
        self.hit_impact_surface = false;
        self.stunting = false;
    }

    /// Score a collision with a non-character surface.
    ///
    /// Returns `None` once this fall's impact has been scored. A grounded
    /// character still gets a report (worth nothing, its height being zero)
    /// but does not consume the fall's impact.
    pub fn register_impact(
        &mut self,
        relative_speed: f32,
        cfg: &TuningConfig,
    ) -> Option<ImpactReport> {
        if self.hit_impact_surface {
            return None;
        }
        let report = ImpactReport::compute(
            relative_speed,
            self.max_height_this_fall,
            self.stunt_multiplier,
            cfg,
        );
        if self.is_airborne() {
            self.hit_impact_surface = true;
            self.impact_force = report.force;
        }
        Some(report)
    }

    /// Close the current fall, returning its summary and clearing fall-scoped state.
    pub fn finish(&mut self, timestamp_ms: u64) -> FallSummary {
        let summary = FallSummary {
            max_height: self.max_height_this_fall,
            duration_ms: timestamp_ms.saturating_sub(self.fall_start_ms),
            performed_stunts: std::mem::take(&mut self.performed_stunts),
            stunt_multiplier: self.stunt_multiplier,
            impact_force: self.impact_force,
        };
        self.land();
        summary
    }

    /// Restore the initial state, as on respawn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the two-state machine with a fresh sample.
    pub fn observe(&mut self, sample: &BodySample, cfg: &TuningConfig) -> Option<FallTransition> {
        let falling = sample.velocity.y > cfg.fall_velocity_threshold;
        match self.phase {
            FallPhase::Grounded if falling => {
                self.begin_fall(sample.timestamp_ms, sample.position.y);
                debug!(
                    "fall started at y={:.1} t={}",
                    sample.position.y, sample.timestamp_ms
                );
                Some(FallTransition::Started {
                    origin_y: sample.position.y,
                    timestamp_ms: sample.timestamp_ms,
                })
            }
            FallPhase::Grounded => None,
            FallPhase::Airborne => {
                self.current_height = ((sample.position.y - self.fall_origin_y)
                    / cfg.height_units_per_meter)
                    .max(0.0);
                self.max_height_this_fall = self.max_height_this_fall.max(self.current_height);

                let supported = sample.ground_clearance < cfg.near_ground_threshold;
                if !(supported && !falling) {
                    return None;
                }

                debug!("landed after {:.1}m", self.max_height_this_fall);
                Some(FallTransition::Landed(self.finish(sample.timestamp_ms)))
            }
        }
    }

    /// Whether `y` lies within the proximity band around a level's ground line.
    #[must_use]
    pub fn is_near_ground_y(y: f32, ground_y: f32, cfg: &TuningConfig) -> bool {
        (y - ground_y).abs() <= cfg.ground_proximity_band
    }
}
