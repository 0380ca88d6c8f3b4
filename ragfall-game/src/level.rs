//! Level definitions, play modes and the level-complete lifecycle.
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Story,
    Challenge,
}

impl GameMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Challenge => "challenge",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(Self::Story),
            "challenge" => Ok(Self::Challenge),
            _ => Err(()),
        }
    }
}

/// A bonus surface worth a fixed number of points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDef {
    pub id: String,
    pub points: u64,
}

/// Static description of one vertical shaft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub id: u32,
    pub name: String,
    /// World y coordinate of the shaft floor.
    pub ground_y: f32,
    pub spawn: Vec2,
    #[serde(default = "default_scale")]
    pub score_multiplier: f64,
    /// Multiplier on world gravity while this level is loaded.
    #[serde(default = "default_gravity_scale")]
    pub gravity_scale: f32,
    #[serde(default)]
    pub targets: Vec<TargetDef>,
    /// Cumulative session score that unlocks this level.
    #[serde(default)]
    pub unlock_score_threshold: u64,
    #[serde(default)]
    pub unlocked: bool,
}

fn default_scale() -> f64 {
    1.0
}

fn default_gravity_scale() -> f32 {
    1.0
}

impl LevelDef {
    #[must_use]
    pub fn target(&self, id: &str) -> Option<&TargetDef> {
        self.targets.iter().find(|target| target.id == id)
    }
}

/// Ordered level list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub levels: Vec<LevelDef>,
}

impl LevelCatalog {
    /// Load levels from `{ "levels": [...] }` JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.unlock_by_score(0);
        Ok(catalog)
    }

    #[must_use]
    pub fn default_levels() -> Self {
        let level = |id, name: &str, score_multiplier, unlock_score_threshold| LevelDef {
            id,
            name: name.to_string(),
            ground_y: 39_950.0,
            spawn: Vec2::new(400.0, 100.0),
            score_multiplier,
            gravity_scale: 1.0,
            targets: Vec::new(),
            unlock_score_threshold,
            unlocked: unlock_score_threshold == 0,
        };
        let target = |id: &str, points| TargetDef {
            id: id.to_string(),
            points,
        };
        Self {
            levels: vec![
                level(1, "Supply Room", 1.0, 0),
                LevelDef {
                    gravity_scale: 1.1,
                    ..level(2, "Mountain Peak", 1.5, 5)
                },
                LevelDef {
                    targets: vec![target("billboard", 2_000), target("water-tower", 3_000)],
                    ..level(3, "City Rooftops", 2.0, 10)
                },
            ],
        }
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&LevelDef> {
        self.levels.iter().find(|level| level.id == id)
    }

    /// The level registered after `id`, if any.
    #[must_use]
    pub fn next_after(&self, id: u32) -> Option<&LevelDef> {
        let index = self.levels.iter().position(|level| level.id == id)?;
        self.levels.get(index + 1)
    }

    #[must_use]
    pub fn first(&self) -> Option<&LevelDef> {
        self.levels.first()
    }

    #[must_use]
    pub fn is_unlocked(&self, id: u32) -> bool {
        self.get(id).is_some_and(|level| level.unlocked)
    }

    /// Unlock every level whose threshold the cumulative score has reached,
    /// returning the names unlocked by this call.
    pub fn unlock_by_score(&mut self, cumulative_score: u64) -> Vec<String> {
        self.levels
            .iter_mut()
            .filter(|level| !level.unlocked && level.unlock_score_threshold <= cumulative_score)
            .map(|level| {
                level.unlocked = true;
                level.name.clone()
            })
            .collect()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::default_levels()
    }
}

/// One-shot level-complete transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LevelCompletion {
    #[default]
    Idle,
    Pending { fire_at_ms: u64 },
    Fired,
}

impl LevelCompletion {
    /// Schedule completion; ignored unless idle.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> bool {
        if *self != Self::Idle {
            return false;
        }
        *self = Self::Pending {
            fire_at_ms: now_ms.saturating_add(delay_ms),
        };
        true
    }

    /// Fire the pending transition once its delay has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match *self {
            Self::Pending { fire_at_ms } if now_ms >= fire_at_ms => {
                *self = Self::Fired;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub const fn has_fired(self) -> bool {
        matches!(self, Self::Fired)
    }
}
