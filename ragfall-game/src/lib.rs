//! Ragfall Game Core
//!
//! Platform-agnostic stunt, fall and scoring logic for the Ragfall ragdoll platformer.
//! Rendering, audio and the rigid-body simulator stay outside this crate; the
//! simulator is reached through [`PhysicsBackend`].

pub mod character;
pub mod combo;
pub mod config;
pub mod constants;
pub mod content;
pub mod fall;
pub mod highscore;
pub mod impact;
pub mod input;
pub mod level;
pub mod numbers;
pub mod physics;
pub mod score;
pub mod session;
pub mod storage;
pub mod stunts;

// Re-export commonly used types
pub use character::Character;
pub use combo::{ComboRecognizer, ComboSnapshot};
pub use config::{ConfigError, StackingRule, TuningConfig};
pub use content::{BuiltinContent, ContentError, DirContent};
pub use fall::{BodySample, FallPhase, FallState, FallSummary, FallTransition};
pub use highscore::{HighScoreLedger, HighScoreTable};
pub use impact::{
    ImpactReport, apply_level_multiplier, calculate_impact, calculate_score, impact_force,
    impact_score,
};
pub use input::{Direction, InputEvent};
pub use level::{GameMode, LevelCatalog, LevelCompletion, LevelDef, TargetDef};
pub use physics::{
    BodyLabel, BodyPart, BodyState, CharacterContact, CollisionEvent, Contact, PhysicsBackend,
};
pub use score::{ScoreDisplay, ScoreRecord};
pub use session::{GameEvent, GameSession, HudSnapshot, LevelSummary};
pub use storage::{FileStorage, MemoryStorage, StorageError};
pub use stunts::{
    CatalogError, Difficulty, PartImpulse, Stunt, StuntCatalog, StuntEffect, StuntOutcome,
    apply_stunt_effect,
};

/// Trait for abstracting where stunts, levels and tuning come from
/// Platform-specific implementations should provide this
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the stunt catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or fails validation.
    fn load_stunts(&self) -> Result<StuntCatalog, Self::Error>;

    /// Load the ordered level list
    ///
    /// # Errors
    ///
    /// Returns an error if the level data cannot be read or parsed.
    fn load_levels(&self) -> Result<LevelCatalog, Self::Error>;

    /// Load tuning parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the tuning cannot be read or violates its invariants.
    fn load_tuning(&self) -> Result<TuningConfig, Self::Error>;
}

/// Trait for abstracting high-score persistence
/// Platform-specific implementations should provide this
pub trait HighScoreStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the persisted table; `Ok(None)` when nothing has been saved yet
    ///
    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be read or decoded.
    fn load_table(&self) -> Result<Option<HighScoreTable>, Self::Error>;

    /// Replace the persisted table
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    fn save_table(&self, table: &HighScoreTable) -> Result<(), Self::Error>;
}

/// Main game engine for creating sessions over shared content and storage
pub struct GameEngine<L, S>
where
    L: ContentLoader,
    S: HighScoreStorage + Clone,
{
    content: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: ContentLoader,
    S: HighScoreStorage + Clone,
{
    /// Create a new game engine with the provided content loader and storage
    pub const fn new(content: L, storage: S) -> Self {
        Self { content, storage }
    }

    /// Construct a session for `mode` from freshly loaded content.
    ///
    /// # Errors
    ///
    /// Returns an error if any content fails to load, the tuning is invalid,
    /// or the level list is empty.
    pub fn create_session(&self, mode: GameMode) -> anyhow::Result<GameSession<S>> {
        use anyhow::Context as _;

        let cfg = self.content.load_tuning().context("loading tuning")?;
        cfg.validate().context("validating tuning")?;
        let levels = self.content.load_levels().context("loading levels")?;
        anyhow::ensure!(levels.first().is_some(), "level list is empty");
        let stunts = self.content.load_stunts().context("loading stunts")?;
        Ok(GameSession::new(
            mode,
            cfg,
            levels,
            stunts,
            self.storage.clone(),
        ))
    }

    /// Read the persisted high-score table without starting a session
    ///
    /// # Errors
    ///
    /// Returns an error if the stored table exists but cannot be read.
    pub fn high_scores(&self) -> Result<HighScoreTable, S::Error> {
        Ok(self.storage.load_table()?.unwrap_or_default())
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
