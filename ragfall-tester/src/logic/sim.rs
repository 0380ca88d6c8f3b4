use std::collections::HashMap;

use glam::Vec2;
use ragfall_game::{BodyLabel, BodyPart, BodyState, CollisionEvent, LevelDef, PhysicsBackend};

/// Length of one physics step in milliseconds.
pub const STEP_MS: u64 = 16;
pub const STEP_SECS: f32 = 0.016;
/// Downward acceleration per step, in units per step squared.
const GRAVITY: f32 = 2.5;
const RESTITUTION: f32 = 0.1;
const GROUND_FRICTION: f32 = 0.8;
/// Rebounds slower than this come to rest.
const SETTLE_SPEED: f32 = 1.0;
/// Height above the ground the torso must clear before another ground contact counts.
const CONTACT_SLOP: f32 = 2.0;

/// Where a bonus target hangs in the shaft.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPlacement {
    pub id: String,
    pub y: f32,
}

/// Point-mass ragdoll falling down a shaft.
///
/// Only the torso is integrated; limbs report the torso's kinematics with a
/// fixed offset and forward impulses to it scaled by their share of the mass.
/// Every contact is reported from the groin.
#[derive(Debug, Clone)]
pub struct SimPhysics {
    ground_y: f32,
    gravity: f32,
    torso: BodyState,
    spins: HashMap<BodyPart, f32>,
    targets: Vec<TargetPlacement>,
    crossed: Vec<String>,
    in_contact: bool,
}

impl SimPhysics {
    #[must_use]
    pub fn new(level: &LevelDef, targets: Vec<TargetPlacement>) -> Self {
        Self {
            ground_y: level.ground_y,
            gravity: GRAVITY * level.gravity_scale,
            torso: BodyState {
                position: level.spawn,
                ..BodyState::default()
            },
            spins: HashMap::new(),
            targets,
            crossed: Vec::new(),
            in_contact: false,
        }
    }

    /// Advance one step, returning collision-start events.
    pub fn step(&mut self) -> Vec<CollisionEvent> {
        let mut events = Vec::new();
        let previous_y = self.torso.position.y;

        self.torso.velocity.y += self.gravity;
        self.torso.position += self.torso.velocity;
        self.torso.angle += self.torso.angular_velocity;

        for target in &self.targets {
            if previous_y < target.y
                && self.torso.position.y >= target.y
                && !self.crossed.contains(&target.id)
            {
                self.crossed.push(target.id.clone());
                events.push(CollisionEvent::new(
                    BodyLabel::Character(BodyPart::Groin),
                    BodyLabel::Target(target.id.clone()),
                    self.torso.velocity,
                ));
            }
        }

        if self.torso.position.y >= self.ground_y {
            if !self.in_contact {
                events.push(CollisionEvent::new(
                    BodyLabel::Character(BodyPart::Groin),
                    BodyLabel::Ground,
                    self.torso.velocity,
                ));
                self.in_contact = true;
            }
            self.torso.position.y = self.ground_y;
            let rebound = -self.torso.velocity.y * RESTITUTION;
            self.torso.velocity.y = if rebound.abs() < SETTLE_SPEED {
                0.0
            } else {
                rebound
            };
            self.torso.velocity.x *= GROUND_FRICTION;
            self.torso.angular_velocity *= GROUND_FRICTION;
        } else if self.torso.position.y < self.ground_y - CONTACT_SLOP {
            self.in_contact = false;
        }

        events
    }

    #[must_use]
    pub const fn torso(&self) -> BodyState {
        self.torso
    }

    fn mass_share(part: BodyPart) -> f32 {
        match part {
            BodyPart::Torso => 1.0,
            BodyPart::Head => 0.5,
            _ => 0.25,
        }
    }

    fn offset(part: BodyPart) -> Vec2 {
        match part {
            BodyPart::Head => Vec2::new(0.0, -30.0),
            BodyPart::Groin => Vec2::new(0.0, 20.0),
            BodyPart::LeftArm => Vec2::new(-20.0, -10.0),
            BodyPart::RightArm => Vec2::new(20.0, -10.0),
            BodyPart::LeftLeg => Vec2::new(-10.0, 35.0),
            BodyPart::RightLeg => Vec2::new(10.0, 35.0),
            BodyPart::Torso => Vec2::ZERO,
        }
    }
}

impl PhysicsBackend for SimPhysics {
    fn body_state(&self, part: BodyPart) -> Option<BodyState> {
        Some(BodyState {
            position: self.torso.position + Self::offset(part),
            angular_velocity: self
                .spins
                .get(&part)
                .copied()
                .unwrap_or(self.torso.angular_velocity),
            ..self.torso
        })
    }

    fn ground_clearance(&self) -> f32 {
        (self.ground_y - self.torso.position.y).max(0.0)
    }

    fn apply_impulse(&mut self, part: BodyPart, impulse: Vec2) {
        self.torso.velocity += impulse * Self::mass_share(part);
    }

    fn set_angular_velocity(&mut self, part: BodyPart, angular_velocity: f32) {
        if part == BodyPart::Torso {
            self.torso.angular_velocity = angular_velocity;
        }
        self.spins.insert(part, angular_velocity);
    }

    fn set_angle(&mut self, part: BodyPart, angle: f32) {
        if part == BodyPart::Torso {
            self.torso.angle = angle;
        }
    }

    fn reset_world(&mut self, spawn: Vec2) {
        self.torso = BodyState {
            position: spawn,
            ..BodyState::default()
        };
        self.spins.clear();
        self.crossed.clear();
        self.in_contact = false;
    }
}
