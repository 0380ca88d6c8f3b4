//! Boundary with the external rigid-body simulator.
//!
//! The core never integrates bodies itself. Hosts wrap their physics engine in
//! a [`PhysicsBackend`] and forward collision-start notifications as
//! [`CollisionEvent`]s. Coordinates follow screen convention: `y` grows downward.
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ragdoll body segments addressable through the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Torso,
    Head,
    /// The only part whose impacts score.
    Groin,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

/// Kinematic snapshot of one body.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
}

/// Label attached to each body taking part in a collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLabel {
    Character(BodyPart),
    Ground,
    Platform,
    Obstacle,
    Target(String),
}

impl BodyLabel {
    #[must_use]
    pub const fn is_character(&self) -> bool {
        matches!(self, Self::Character(_))
    }
}

impl fmt::Display for BodyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(part) => write!(f, "character:{part:?}"),
            Self::Ground => f.write_str("ground"),
            Self::Platform => f.write_str("platform"),
            Self::Obstacle => f.write_str("obstacle"),
            Self::Target(id) => write!(f, "target:{id}"),
        }
    }
}

/// What the character hit in a collision, seen from the character's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact<'a> {
    /// Any non-character surface that is not a bonus target.
    Surface,
    Target(&'a str),
}

/// A character body part touching something outside the ragdoll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterContact<'a> {
    pub part: BodyPart,
    pub contact: Contact<'a>,
}

impl CharacterContact<'_> {
    /// Whether this contact can score a fall impact.
    #[must_use]
    pub fn is_scoring(&self) -> bool {
        self.part == BodyPart::Groin
    }
}

/// Collision-start notification for a labelled body pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub a: BodyLabel,
    pub b: BodyLabel,
    pub relative_velocity: Vec2,
}

impl CollisionEvent {
    #[must_use]
    pub fn new(a: BodyLabel, b: BodyLabel, relative_velocity: Vec2) -> Self {
        Self {
            a,
            b,
            relative_velocity,
        }
    }

    /// Classify the pair from the character's perspective.
    ///
    /// Returns `None` when neither body is part of the character, or both are
    /// (limbs brushing each other).
    #[must_use]
    pub fn character_contact(&self) -> Option<CharacterContact<'_>> {
        let (part, other) = match (&self.a, &self.b) {
            (BodyLabel::Character(part), other) | (other, BodyLabel::Character(part))
                if !other.is_character() =>
            {
                (*part, other)
            }
            _ => return None,
        };
        let contact = match other {
            BodyLabel::Target(id) => Contact::Target(id.as_str()),
            _ => Contact::Surface,
        };
        Some(CharacterContact { part, contact })
    }

    #[must_use]
    pub fn impact_speed(&self) -> f32 {
        self.relative_velocity.length()
    }
}

/// Operations the core needs from the rigid-body simulator.
pub trait PhysicsBackend {
    /// Current kinematics of a body part, if the ragdoll exists.
    fn body_state(&self, part: BodyPart) -> Option<BodyState>;

    /// Distance from the character to the nearest supporting surface below it.
    fn ground_clearance(&self) -> f32;

    fn apply_impulse(&mut self, part: BodyPart, impulse: Vec2);

    fn set_angular_velocity(&mut self, part: BodyPart, angular_velocity: f32);

    /// Snap a body to an absolute orientation in radians.
    fn set_angle(&mut self, part: BodyPart, angle: f32);

    /// Clear the world and respawn the ragdoll at `spawn`.
    fn reset_world(&mut self, spawn: Vec2);
}
