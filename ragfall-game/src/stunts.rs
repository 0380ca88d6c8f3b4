//! Stunt registry, unlocks, and the once-per-fall trigger.
use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StackingRule;
use crate::constants::COMBO_CAPACITY;
use crate::fall::FallState;
use crate::input::Direction;
use crate::physics::{BodyPart, PhysicsBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Impulse applied to a single body part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartImpulse {
    pub part: BodyPart,
    pub impulse: Vec2,
}

/// Data-only description of what a stunt does to the ragdoll.
///
/// Applied in field order: orientation, then spin, then impulses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StuntEffect {
    /// Absolute torso orientation in radians.
    #[serde(default)]
    pub torso_angle: Option<f32>,
    /// Torso angular velocity; negative spins backward.
    #[serde(default)]
    pub torso_spin: Option<f32>,
    #[serde(default)]
    pub impulses: Vec<PartImpulse>,
}

impl StuntEffect {
    #[must_use]
    pub fn spin(angular_velocity: f32) -> Self {
        Self {
            torso_spin: Some(angular_velocity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.torso_angle = Some(angle);
        self
    }

    #[must_use]
    pub fn with_impulse(mut self, part: BodyPart, x: f32, y: f32) -> Self {
        self.impulses.push(PartImpulse {
            part,
            impulse: Vec2::new(x, y),
        });
        self
    }
}

/// Interpret a stunt effect against the live ragdoll.
pub fn apply_stunt_effect(effect: &StuntEffect, physics: &mut dyn PhysicsBackend) {
    if let Some(angle) = effect.torso_angle {
        physics.set_angle(BodyPart::Torso, angle);
    }
    if let Some(omega) = effect.torso_spin {
        physics.set_angular_velocity(BodyPart::Torso, omega);
    }
    for push in &effect.impulses {
        physics.apply_impulse(push.part, push.impulse);
    }
}

/// A named mid-air stunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stunt {
    pub name: String,
    pub description: String,
    /// Bonus stacked onto the fall's base multiplier of 1.0.
    pub multiplier: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub unlock_score_threshold: u64,
    #[serde(default)]
    pub unlocked: bool,
    pub input_sequence: Vec<Direction>,
    #[serde(default)]
    pub effect: StuntEffect,
}

impl Stunt {
    #[must_use]
    pub fn new(
        name: &str,
        description: &str,
        multiplier: f64,
        difficulty: Difficulty,
        unlock_score_threshold: u64,
        input_sequence: &[Direction],
        effect: StuntEffect,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            multiplier,
            difficulty,
            unlock_score_threshold,
            unlocked: unlock_score_threshold == 0,
            input_sequence: input_sequence.to_vec(),
            effect,
        }
    }

    /// Whether `buffer` ends with this stunt's exact input sequence.
    #[must_use]
    pub fn matches_suffix(&self, buffer: &[Direction]) -> bool {
        buffer.len() >= self.input_sequence.len()
            && buffer[buffer.len() - self.input_sequence.len()..] == self.input_sequence[..]
    }
}

/// Result of a stunt that actually fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuntOutcome {
    pub name: String,
    pub bonus: f64,
    /// Fall multiplier after this stunt was stacked.
    pub stunt_multiplier: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate stunt name '{0}'")]
    DuplicateName(String),
    #[error("stunt '{0}' has an empty input sequence")]
    EmptySequence(String),
    #[error("stunt '{name}' sequence length {len} exceeds combo capacity {max}")]
    SequenceTooLong { name: String, len: usize, max: usize },
    #[error("stunt '{name}' multiplier must be finite and non-negative (got {value})")]
    InvalidMultiplier { name: String, value: f64 },
    #[error("invalid stunt catalog json: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CatalogFile {
    stunts: Vec<Stunt>,
}

/// Ordered stunt registry. Registration order decides which stunt wins when
/// several sequences match the same input suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuntCatalog {
    stunts: Vec<Stunt>,
}

impl StuntCatalog {
    /// Build a catalog, checking name uniqueness and sequence shape.
    ///
    /// # Errors
    ///
    /// Returns the first invalid stunt definition encountered.
    pub fn from_stunts(stunts: Vec<Stunt>) -> Result<Self, CatalogError> {
        let mut seen: Vec<&str> = Vec::with_capacity(stunts.len());
        for stunt in &stunts {
            if seen.contains(&stunt.name.as_str()) {
                return Err(CatalogError::DuplicateName(stunt.name.clone()));
            }
            seen.push(&stunt.name);
            if stunt.input_sequence.is_empty() {
                return Err(CatalogError::EmptySequence(stunt.name.clone()));
            }
            if stunt.input_sequence.len() > COMBO_CAPACITY {
                return Err(CatalogError::SequenceTooLong {
                    name: stunt.name.clone(),
                    len: stunt.input_sequence.len(),
                    max: COMBO_CAPACITY,
                });
            }
            if !stunt.multiplier.is_finite() || stunt.multiplier < 0.0 {
                return Err(CatalogError::InvalidMultiplier {
                    name: stunt.name.clone(),
                    value: stunt.multiplier,
                });
            }
        }
        let mut catalog = Self { stunts };
        catalog.unlock_by_score(0);
        Ok(catalog)
    }

    /// Load a catalog from `{ "stunts": [...] }` JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a stunt is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::from_stunts(file.stunts)
    }

    /// Serialize the catalog, including unlock progress.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&CatalogFile {
            stunts: self.stunts.clone(),
        })
    }

    /// The built-in stunt set.
    ///
    /// Registration order is significant: the two-symbol flips shadow the
    /// longer flip chains that end with the same symbols.
    #[must_use]
    pub fn default_catalog() -> Self {
        use BodyPart::{Groin, LeftArm, LeftLeg, RightArm, RightLeg, Torso};
        use Difficulty::{Easy, Expert, Hard, Medium};
        use Direction::{Down, Left, Right, Up};

        let stunts = vec![
            Stunt::new(
                "Backflip",
                "Perform a backward flip in the air",
                0.3,
                Easy,
                0,
                &[Up, Down],
                StuntEffect::spin(-0.2).with_impulse(Torso, 0.0, -0.01),
            ),
            Stunt::new(
                "Frontflip",
                "Perform a forward flip in the air",
                0.3,
                Easy,
                0,
                &[Down, Up],
                StuntEffect::spin(0.2).with_impulse(Torso, 0.0, -0.01),
            ),
            Stunt::new(
                "Spin",
                "Perform a 360-degree spin in the air",
                0.2,
                Easy,
                0,
                &[Left, Right],
                StuntEffect::spin(0.15),
            ),
            Stunt::new(
                "Double Backflip",
                "Perform two backward flips in succession",
                0.6,
                Medium,
                5_000,
                &[Up, Down, Up, Down],
                StuntEffect::spin(-0.3).with_impulse(Torso, 0.0, -0.02),
            ),
            Stunt::new(
                "Double Frontflip",
                "Perform two forward flips in succession",
                0.6,
                Medium,
                5_000,
                &[Down, Up, Down, Up],
                StuntEffect::spin(0.3).with_impulse(Torso, 0.0, -0.02),
            ),
            Stunt::new(
                "Corkscrew",
                "Perform a diagonal spinning flip",
                0.5,
                Medium,
                7_500,
                &[Up, Right, Down, Left],
                StuntEffect::spin(0.2)
                    .with_impulse(Torso, 0.01, -0.015)
                    .with_impulse(LeftArm, -0.001, -0.001)
                    .with_impulse(RightArm, 0.001, -0.001),
            ),
            Stunt::new(
                "Triple Backflip",
                "Perform three backward flips in succession",
                1.0,
                Hard,
                15_000,
                &[Up, Down, Up, Down, Up, Down],
                StuntEffect::spin(-0.4).with_impulse(Torso, 0.0, -0.03),
            ),
            Stunt::new(
                "Superman",
                "Stretch out like Superman while flying through the air",
                0.8,
                Hard,
                10_000,
                &[Right, Right, Up],
                StuntEffect::default()
                    .with_impulse(LeftArm, -0.002, -0.001)
                    .with_impulse(RightArm, 0.002, -0.001)
                    .with_impulse(LeftLeg, -0.001, 0.001)
                    .with_impulse(RightLeg, 0.001, 0.001)
                    .with_impulse(Torso, 0.01, 0.0),
            ),
            Stunt::new(
                "Cannonball",
                "Curl up into a ball for maximum impact",
                0.7,
                Medium,
                8_000,
                &[Down, Down],
                StuntEffect::default()
                    .with_impulse(LeftArm, 0.002, 0.002)
                    .with_impulse(RightArm, -0.002, 0.002)
                    .with_impulse(LeftLeg, 0.002, -0.002)
                    .with_impulse(RightLeg, -0.002, -0.002)
                    .with_impulse(Torso, 0.0, 0.01),
            ),
            Stunt::new(
                "Helicopter",
                "Spin rapidly like a helicopter",
                1.2,
                Expert,
                20_000,
                &[Left, Right, Left, Right],
                StuntEffect::spin(0.5)
                    .with_impulse(LeftArm, -0.003, 0.0)
                    .with_impulse(RightArm, 0.003, 0.0),
            ),
            Stunt::new(
                "Spread Eagle",
                "Spread out all limbs for maximum air resistance",
                0.9,
                Hard,
                12_000,
                &[Up, Left, Right, Down],
                StuntEffect::default()
                    .with_impulse(LeftArm, -0.003, -0.001)
                    .with_impulse(RightArm, 0.003, -0.001)
                    .with_impulse(LeftLeg, -0.002, 0.002)
                    .with_impulse(RightLeg, 0.002, 0.002)
                    .with_impulse(Torso, 0.0, -0.005),
            ),
            Stunt::new(
                "Groin Torpedo",
                "Position for maximum groin impact velocity",
                1.5,
                Expert,
                25_000,
                &[Down, Down, Up, Down],
                StuntEffect::default()
                    .with_angle(std::f32::consts::PI)
                    .with_impulse(Groin, 0.0, 0.005)
                    .with_impulse(LeftArm, -0.001, -0.002)
                    .with_impulse(RightArm, 0.001, -0.002)
                    .with_impulse(LeftLeg, -0.001, -0.001)
                    .with_impulse(RightLeg, 0.001, -0.001)
                    .with_impulse(Torso, 0.0, 0.02),
            ),
        ];

        Self { stunts }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Stunt> {
        self.stunts.iter().find(|stunt| stunt.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stunt> {
        self.stunts.iter()
    }

    /// Unlocked stunts in registration order.
    pub fn unlocked(&self) -> impl Iterator<Item = &Stunt> {
        self.stunts.iter().filter(|stunt| stunt.unlocked)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stunts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stunts.is_empty()
    }

    /// First unlocked stunt whose sequence ends `buffer`.
    #[must_use]
    pub fn match_suffix(&self, buffer: &[Direction]) -> Option<&Stunt> {
        self.unlocked().find(|stunt| stunt.matches_suffix(buffer))
    }

    /// Unlock every stunt whose threshold the cumulative score has reached,
    /// returning only the names unlocked by this call.
    pub fn unlock_by_score(&mut self, cumulative_score: u64) -> Vec<String> {
        self.stunts
            .iter_mut()
            .filter(|stunt| !stunt.unlocked && stunt.unlock_score_threshold <= cumulative_score)
            .map(|stunt| {
                stunt.unlocked = true;
                stunt.name.clone()
            })
            .collect()
    }

    /// Perform a stunt for the current fall.
    ///
    /// Silently ignored unless the character is airborne, the stunt exists and
    /// is unlocked, and it has not already been performed during this fall.
    pub fn trigger(
        &self,
        name: &str,
        fall: &mut FallState,
        stacking: StackingRule,
        physics: &mut dyn PhysicsBackend,
    ) -> Option<StuntOutcome> {
        if !fall.is_airborne() {
            return None;
        }
        let stunt = self.get(name).filter(|stunt| stunt.unlocked)?;
        if fall.has_performed(&stunt.name) {
            debug!("stunt '{name}' already performed this fall");
            return None;
        }

        apply_stunt_effect(&stunt.effect, physics);
        fall.record_stunt(&stunt.name, stacking.stack(fall.stunt_multiplier, stunt.multiplier));
        debug!(
            "stunt '{}' performed, multiplier now {:.2}",
            stunt.name, fall.stunt_multiplier
        );

        Some(StuntOutcome {
            name: stunt.name.clone(),
            bonus: stunt.multiplier,
            stunt_multiplier: fall.stunt_multiplier,
        })
    }
}

impl Default for StuntCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
