use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ragfall_game::{
    ContentLoader, Direction, GameEvent, GameMode, GameSession, HighScoreStorage, HudSnapshot,
    LevelCatalog, ScoreRecord, StuntCatalog, TuningConfig,
};

use super::sim::{STEP_MS, STEP_SECS, SimPhysics, TargetPlacement};

/// Immutable content shared by every simulated session.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub tuning: TuningConfig,
    pub levels: LevelCatalog,
    pub stunts: StuntCatalog,
}

impl TesterAssets {
    /// Load and validate content from `loader`.
    ///
    /// # Errors
    ///
    /// Returns an error if any content fails to load or the tuning is invalid.
    pub fn load<L: ContentLoader>(loader: &L) -> Result<Self> {
        let tuning = loader.load_tuning().context("loading tuning")?;
        tuning.validate().context("validating tuning")?;
        let levels = loader.load_levels().context("loading levels")?;
        anyhow::ensure!(levels.first().is_some(), "level list is empty");
        let stunts = loader.load_stunts().context("loading stunts")?;
        Ok(Self {
            tuning,
            levels,
            stunts,
        })
    }
}

impl Default for TesterAssets {
    fn default() -> Self {
        Self {
            tuning: TuningConfig::default(),
            levels: LevelCatalog::default_levels(),
            stunts: StuntCatalog::default_catalog(),
        }
    }
}

/// Scripted player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Key(Direction),
    RestartLevel,
}

/// An action scheduled at `at_ms`, delayed by up to `jitter_ms` per seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedAction {
    pub at_ms: u64,
    pub jitter_ms: u64,
    pub action: Action,
}

/// Declarative plan for one simulated level attempt.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub mode: GameMode,
    pub level_id: u32,
    pub duration_ms: u64,
    /// Upper bound on the random delay added to each key press.
    pub jitter_ms: u64,
    pub script: Vec<ScriptedAction>,
    pub targets: Vec<TargetPlacement>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(mode: GameMode, level_id: u32) -> Self {
        Self {
            mode,
            level_id,
            duration_ms: 8_000,
            jitter_ms: 25,
            script: Vec::new(),
            targets: Vec::new(),
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Press `keys` one after another, `spacing_ms` apart, starting at `start_ms`.
    #[must_use]
    pub fn with_keys(mut self, start_ms: u64, spacing_ms: u64, keys: &[Direction]) -> Self {
        let mut at_ms = start_ms;
        for &key in keys {
            self.script.push(ScriptedAction {
                at_ms,
                jitter_ms: self.jitter_ms,
                action: Action::Key(key),
            });
            at_ms += spacing_ms;
        }
        self
    }

    #[must_use]
    pub fn with_action(mut self, at_ms: u64, action: Action) -> Self {
        self.script.push(ScriptedAction {
            at_ms,
            jitter_ms: 0,
            action,
        });
        self
    }

    #[must_use]
    pub fn with_target(mut self, id: &str, y: f32) -> Self {
        self.targets.push(TargetPlacement {
            id: id.to_string(),
            y,
        });
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    /// Concrete schedule for `seed`, ordered by time.
    fn schedule(&self, seed: u64) -> Vec<(u64, Action)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut timeline: Vec<(u64, Action)> = self
            .script
            .iter()
            .map(|step| {
                let jitter = if step.jitter_ms == 0 {
                    0
                } else {
                    rng.gen_range(0..=step.jitter_ms)
                };
                (step.at_ms + jitter, step.action)
            })
            .collect();
        timeline.sort_by_key(|(at_ms, _)| *at_ms);
        timeline
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulated level attempt.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub events: Vec<(u64, GameEvent)>,
    pub score: ScoreRecord,
    pub hud: HudSnapshot,
    pub high_scores: Vec<u64>,
}

impl SimulationSummary {
    pub fn events(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().map(|(_, event)| event)
    }

    /// Names of stunts performed, in order.
    #[must_use]
    pub fn stunts(&self) -> Vec<&str> {
        self.events()
            .filter_map(|event| match event {
                GameEvent::StuntPerformed(outcome) => Some(outcome.name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn count(&self, matches: impl Fn(&GameEvent) -> bool) -> usize {
        self.events().filter(|event| matches(event)).count()
    }

    /// Points awarded by scored impacts, in order.
    #[must_use]
    pub fn impact_awards(&self) -> Vec<u64> {
        self.events()
            .filter_map(|event| match event {
                GameEvent::Impact { awarded, .. } => Some(*awarded),
                _ => None,
            })
            .collect()
    }
}

/// Run `plan` against a fresh session backed by `storage`.
pub fn run_plan<S: HighScoreStorage>(
    assets: &TesterAssets,
    plan: &SimulationPlan,
    seed: u64,
    storage: S,
) -> Result<SimulationSummary> {
    let level = assets
        .levels
        .get(plan.level_id)
        .ok_or_else(|| anyhow::anyhow!("level {} is not defined", plan.level_id))?;
    let mut physics = SimPhysics::new(level, plan.targets.clone());
    let mut session = GameSession::new(
        plan.mode,
        assets.tuning.clone(),
        assets.levels.clone(),
        assets.stunts.clone(),
        storage,
    );
    anyhow::ensure!(
        session.start_level(plan.level_id, &mut physics),
        "level {} could not be started",
        plan.level_id
    );

    let timeline = plan.schedule(seed);
    let mut pending = timeline.iter().peekable();
    let mut events = Vec::new();

    let mut now_ms = 0;
    while now_ms <= plan.duration_ms {
        while let Some(&&(at_ms, action)) = pending.peek() {
            if at_ms > now_ms {
                break;
            }
            pending.next();
            match action {
                Action::Key(symbol) => {
                    events.extend(
                        session
                            .on_key(symbol, at_ms, &mut physics)
                            .into_iter()
                            .map(|event| (at_ms, event)),
                    );
                }
                Action::RestartLevel => {
                    session.restart_level(&mut physics);
                }
            }
        }

        for collision in physics.step() {
            events.extend(
                session
                    .on_collision(&collision, now_ms, &physics)
                    .into_iter()
                    .map(|event| (now_ms, event)),
            );
        }
        events.extend(
            session
                .tick(now_ms, STEP_SECS, &physics)
                .into_iter()
                .map(|event| (now_ms, event)),
        );
        now_ms += STEP_MS;
    }

    debug!(
        "plan on level {} seed {seed}: {} events, run score {}, torso at y={:.1}",
        plan.level_id,
        events.len(),
        session.score().total_run_score,
        physics.torso().position.y
    );

    Ok(SimulationSummary {
        seed,
        events,
        score: session.score(),
        hud: session.hud(),
        high_scores: session.ledger().top(plan.mode, plan.level_id).to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragfall_game::MemoryStorage;
    use Direction::{Down, Right, Up};

    #[test]
    fn schedule_is_deterministic_per_seed() {
        let plan = SimulationPlan::new(GameMode::Story, 1).with_keys(100, 200, &[Up, Right, Down]);
        assert_eq!(plan.schedule(7), plan.schedule(7));
        for (i, (at_ms, _)) in plan.schedule(99).into_iter().enumerate() {
            let base = 100 + 200 * u64::try_from(i).unwrap();
            assert!((base..=base + 25).contains(&at_ms));
        }
    }

    #[test]
    fn plain_drop_scores_and_lands() {
        let plan = SimulationPlan::new(GameMode::Story, 1);
        let summary = run_plan(&TesterAssets::default(), &plan, 1, MemoryStorage::default()).unwrap();
        assert!(summary.impact_awards().first().is_some_and(|&points| points > 0));
        assert!(summary.count(|event| matches!(event, GameEvent::Landed(_))) >= 1);
        assert_eq!(
            summary.count(|event| matches!(event, GameEvent::LevelCompleted(_))),
            1
        );
        assert_eq!(summary.high_scores, vec![summary.score.total_run_score]);
    }

    #[test]
    fn builtin_content_loads_as_default_assets() {
        let assets = TesterAssets::load(&ragfall_game::BuiltinContent).unwrap();
        assert_eq!(assets.levels, TesterAssets::default().levels);
        assert_eq!(assets.tuning, TuningConfig::default());
    }

    #[test]
    fn unknown_level_is_an_error() {
        let plan = SimulationPlan::new(GameMode::Challenge, 42);
        assert!(run_plan(&TesterAssets::default(), &plan, 1, MemoryStorage::default()).is_err());
    }
}
