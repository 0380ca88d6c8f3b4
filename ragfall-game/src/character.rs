//! The ragdoll's gameplay-side state: fall tracking plus combo input.
use serde::{Deserialize, Serialize};

use crate::combo::ComboRecognizer;
use crate::config::TuningConfig;
use crate::fall::{BodySample, FallState, FallTransition};
use crate::input::Direction;
use crate::physics::PhysicsBackend;
use crate::stunts::{StuntCatalog, StuntOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub fall: FallState,
    pub combo: ComboRecognizer,
}

impl Character {
    #[must_use]
    pub fn new(cfg: &TuningConfig) -> Self {
        Self {
            fall: FallState::default(),
            combo: ComboRecognizer::new(cfg),
        }
    }

    /// Feed a directional key press; fires at most one stunt.
    pub fn on_key(
        &mut self,
        symbol: Direction,
        timestamp_ms: u64,
        catalog: &StuntCatalog,
        cfg: &TuningConfig,
        physics: &mut dyn PhysicsBackend,
    ) -> Option<StuntOutcome> {
        let eligible = self.fall.is_airborne();
        let name = self.combo.submit(symbol, timestamp_ms, eligible, catalog)?;
        catalog.trigger(&name, &mut self.fall, cfg.stacking, physics)
    }

    pub fn observe(&mut self, sample: &BodySample, cfg: &TuningConfig) -> Option<FallTransition> {
        self.fall.observe(sample, cfg)
    }

    /// Respawn: fresh fall state and an empty combo buffer.
    pub fn reset(&mut self) {
        self.fall.reset();
        self.combo.clear();
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new(&TuningConfig::default())
    }
}
