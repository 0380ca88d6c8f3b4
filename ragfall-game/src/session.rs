//! A play session: one mode, one level at a time, driven by key, collision and tick calls.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::HighScoreStorage;
use crate::character::Character;
use crate::combo::ComboSnapshot;
use crate::config::TuningConfig;
use crate::fall::{BodySample, FallState, FallSummary, FallTransition};
use crate::highscore::HighScoreLedger;
use crate::impact::{ImpactReport, apply_level_multiplier};
use crate::input::Direction;
use crate::level::{GameMode, LevelCatalog, LevelCompletion, LevelDef};
use crate::physics::{BodyPart, CollisionEvent, Contact, PhysicsBackend};
use crate::score::{ScoreDisplay, ScoreRecord};
use crate::stunts::{StuntCatalog, StuntOutcome};

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    FallStarted { origin_y: f32 },
    Landed(FallSummary),
    StuntPerformed(StuntOutcome),
    /// The fall's scoring impact; `awarded` includes the level multiplier.
    Impact { report: ImpactReport, awarded: u64 },
    TargetHit { id: String, points: u64 },
    LevelCompletePending { fire_at_ms: u64 },
    LevelCompleted(LevelSummary),
    StuntsUnlocked(Vec<String>),
    LevelsUnlocked(Vec<String>),
    HighScore { level_id: u32, score: u64, rank: usize },
}

/// End-of-level report, captured when completion is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub mode: GameMode,
    pub level_id: u32,
    pub run_score: u64,
    pub session_total: u64,
    pub falls: u32,
    pub stunts_performed: u32,
    pub best_impact: u64,
    pub targets_hit: Vec<String>,
    pub high_score_rank: Option<usize>,
    pub has_next_level: bool,
    pub next_level_unlocked: bool,
}

/// Everything the HUD draws in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub level_id: u32,
    pub combo: ComboSnapshot,
    pub displayed_score: u64,
    pub run_score: u64,
    pub session_total: u64,
    pub performed_stunts: Vec<String>,
    pub stunt_multiplier: f64,
    pub airborne: bool,
    pub stunting: bool,
    pub current_height: f32,
    pub impact_force: f64,
    pub completion: LevelCompletion,
}

#[derive(Debug, Clone, Copy, Default)]
struct RunStats {
    falls: u32,
    stunts: u32,
    best_impact: u64,
}

/// Owns all mutable game state for one player.
#[derive(Debug)]
pub struct GameSession<S: HighScoreStorage> {
    mode: GameMode,
    cfg: TuningConfig,
    levels: LevelCatalog,
    level_id: u32,
    stunts: StuntCatalog,
    character: Character,
    score: ScoreRecord,
    display: ScoreDisplay,
    completion: LevelCompletion,
    banked: Option<LevelSummary>,
    targets_hit: Vec<String>,
    stats: RunStats,
    ledger: HighScoreLedger<S>,
    now_ms: u64,
}

impl<S: HighScoreStorage> GameSession<S> {
    /// Build a session positioned on the first level. Call [`Self::start_level`]
    /// or [`Self::restart_level`] to spawn the ragdoll.
    #[must_use]
    pub fn new(
        mode: GameMode,
        cfg: TuningConfig,
        levels: LevelCatalog,
        stunts: StuntCatalog,
        storage: S,
    ) -> Self {
        let level_id = levels.first().map_or(0, |level| level.id);
        Self {
            mode,
            character: Character::new(&cfg),
            cfg,
            levels,
            level_id,
            stunts,
            score: ScoreRecord::default(),
            display: ScoreDisplay::default(),
            completion: LevelCompletion::default(),
            banked: None,
            targets_hit: Vec::new(),
            stats: RunStats::default(),
            ledger: HighScoreLedger::load(storage),
            now_ms: 0,
        }
    }

    /// Session over the built-in levels, stunts and tuning.
    #[must_use]
    pub fn with_defaults(mode: GameMode, storage: S) -> Self {
        Self::new(
            mode,
            TuningConfig::default(),
            LevelCatalog::default_levels(),
            StuntCatalog::default_catalog(),
            storage,
        )
    }

    /// Load level `id` and respawn the ragdoll.
    ///
    /// Points from an unfinished attempt are withdrawn from the session total;
    /// points banked by a triggered completion are kept. Unknown ids leave the
    /// session untouched. Locks are not checked here; see [`Self::next_level`].
    pub fn start_level(&mut self, id: u32, physics: &mut dyn PhysicsBackend) -> bool {
        let Some(spawn) = self.levels.get(id).map(|level| level.spawn) else {
            warn!("level {id} does not exist");
            return false;
        };
        if self.completion == LevelCompletion::Idle {
            self.score.abandon_run();
        } else {
            self.score.start_run();
        }
        self.level_id = id;
        self.character.reset();
        self.completion.reset();
        self.banked = None;
        self.targets_hit.clear();
        self.stats = RunStats::default();
        self.display.snap(0);
        physics.reset_world(spawn);
        info!("{} level {id} started", self.mode);
        true
    }

    pub fn restart_level(&mut self, physics: &mut dyn PhysicsBackend) -> bool {
        self.start_level(self.level_id, physics)
    }

    /// Advance to the level after the current one.
    ///
    /// A locked next level is unlocked first if the session total has reached
    /// its threshold; otherwise the session stays where it is.
    pub fn next_level(&mut self, physics: &mut dyn PhysicsBackend) -> bool {
        let Some((next, threshold)) = self
            .levels
            .next_after(self.level_id)
            .map(|level| (level.id, level.unlock_score_threshold))
        else {
            return false;
        };
        if !self.levels.is_unlocked(next) {
            self.levels.unlock_by_score(self.score.session_total_score);
        }
        if !self.levels.is_unlocked(next) {
            info!(
                "level {next} needs {threshold} points, session has {}",
                self.score.session_total_score
            );
            return false;
        }
        self.start_level(next, physics)
    }

    pub fn on_key(
        &mut self,
        symbol: Direction,
        timestamp_ms: u64,
        physics: &mut dyn PhysicsBackend,
    ) -> Vec<GameEvent> {
        self.now_ms = self.now_ms.max(timestamp_ms);
        let mut events = Vec::new();
        if let Some(outcome) =
            self.character
                .on_key(symbol, timestamp_ms, &self.stunts, &self.cfg, physics)
        {
            self.stats.stunts += 1;
            events.push(GameEvent::StuntPerformed(outcome));
        }
        events
    }

    /// Handle a collision-start event reported by the physics layer.
    ///
    /// Any body part collects a target's bonus; only groin contacts score an
    /// impact or trigger level completion. Once completion is triggered the
    /// run is frozen and further contacts are ignored.
    pub fn on_collision(
        &mut self,
        event: &CollisionEvent,
        now_ms: u64,
        physics: &dyn PhysicsBackend,
    ) -> Vec<GameEvent> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut events = Vec::new();
        if self.completion != LevelCompletion::Idle {
            return events;
        }
        let Some(hit) = event.character_contact() else {
            return events;
        };
        if let Contact::Target(id) = hit.contact {
            self.hit_target(id, &mut events);
        }
        if hit.is_scoring() {
            self.score_impact(event.impact_speed(), &mut events);
            self.check_completion(now_ms, physics, &mut events);
        }
        events
    }

    /// Sample the ragdoll, ease the score counter and advance level completion.
    pub fn tick(
        &mut self,
        now_ms: u64,
        dt_secs: f32,
        physics: &dyn PhysicsBackend,
    ) -> Vec<GameEvent> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut events = Vec::new();
        if let Some(sample) = BodySample::from_backend(physics, now_ms) {
            match self.character.observe(&sample, &self.cfg) {
                Some(FallTransition::Started { origin_y, .. }) => {
                    self.stats.falls += 1;
                    events.push(GameEvent::FallStarted { origin_y });
                }
                Some(FallTransition::Landed(summary)) => events.push(GameEvent::Landed(summary)),
                None => {}
            }
        }
        self.display.update(
            self.score.total_run_score,
            dt_secs,
            self.cfg.score_easing_rate,
        );
        if self.completion.poll(now_ms)
            && let Some(summary) = self.banked.take()
        {
            info!(
                "{} level {} complete: run {} session {}",
                self.mode, summary.level_id, summary.run_score, summary.session_total
            );
            self.display.snap(summary.run_score);
            events.push(GameEvent::LevelCompleted(summary));
        }
        events
    }

    #[must_use]
    pub fn hud(&self) -> HudSnapshot {
        let fall = &self.character.fall;
        HudSnapshot {
            level_id: self.level_id,
            combo: self.character.combo.snapshot(self.now_ms),
            displayed_score: self.display.value(),
            run_score: self.score.total_run_score,
            session_total: self.score.session_total_score,
            performed_stunts: fall.performed_stunts.clone(),
            stunt_multiplier: fall.stunt_multiplier,
            airborne: fall.is_airborne(),
            stunting: fall.stunting,
            current_height: fall.current_height,
            impact_force: fall.impact_force,
            completion: self.completion,
        }
    }

    /// Whether the current run score would enter this level's top five.
    #[must_use]
    pub fn is_high_score(&self) -> bool {
        self.ledger
            .is_high_score(self.mode, self.level_id, self.score.total_run_score)
    }

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub const fn level_id(&self) -> u32 {
        self.level_id
    }

    #[must_use]
    pub fn level(&self) -> Option<&LevelDef> {
        self.levels.get(self.level_id)
    }

    #[must_use]
    pub const fn score(&self) -> ScoreRecord {
        self.score
    }

    #[must_use]
    pub const fn character(&self) -> &Character {
        &self.character
    }

    #[must_use]
    pub const fn stunts(&self) -> &StuntCatalog {
        &self.stunts
    }

    #[must_use]
    pub const fn completion(&self) -> LevelCompletion {
        self.completion
    }

    #[must_use]
    pub const fn config(&self) -> &TuningConfig {
        &self.cfg
    }

    #[must_use]
    pub fn targets_hit(&self) -> &[String] {
        &self.targets_hit
    }

    #[must_use]
    pub const fn ledger(&self) -> &HighScoreLedger<S> {
        &self.ledger
    }

    fn hit_target(&mut self, id: &str, events: &mut Vec<GameEvent>) {
        let Some(points) = self
            .level()
            .and_then(|level| level.target(id))
            .map(|target| target.points)
        else {
            debug!("ignoring unknown target '{id}'");
            return;
        };
        if self.targets_hit.iter().any(|hit| hit == id) {
            return;
        }
        self.targets_hit.push(id.to_string());
        self.score.add(points);
        debug!("target '{id}' hit for {points}");
        events.push(GameEvent::TargetHit {
            id: id.to_string(),
            points,
        });
    }

    fn score_impact(&mut self, relative_speed: f32, events: &mut Vec<GameEvent>) {
        if !self.character.fall.is_airborne() {
            return;
        }
        let Some(report) = self
            .character
            .fall
            .register_impact(relative_speed, &self.cfg)
        else {
            return;
        };
        let level_multiplier = self.level().map_or(1.0, |level| level.score_multiplier);
        let awarded = apply_level_multiplier(report.score, level_multiplier);
        self.score.add(awarded);
        self.stats.best_impact = self.stats.best_impact.max(awarded);
        debug!(
            "impact force {:.1} from {:.1}m scored {awarded}",
            report.force, report.max_height
        );
        events.push(GameEvent::Impact { report, awarded });
    }

    fn check_completion(
        &mut self,
        now_ms: u64,
        physics: &dyn PhysicsBackend,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(ground_y) = self.level().map(|level| level.ground_y) else {
            return;
        };
        let Some(torso) = physics.body_state(BodyPart::Torso) else {
            return;
        };
        if FallState::is_near_ground_y(torso.position.y, ground_y, &self.cfg)
            && self
                .completion
                .schedule(now_ms, self.cfg.level_complete_delay_ms)
            && let LevelCompletion::Pending { fire_at_ms } = self.completion
        {
            debug!("level {} completes at {fire_at_ms}", self.level_id);
            events.push(GameEvent::LevelCompletePending { fire_at_ms });
            self.bank_level(events);
        }
    }

    /// Record the run as it stands now: high score, unlocks and the summary
    /// shown once the completion delay has elapsed.
    fn bank_level(&mut self, events: &mut Vec<GameEvent>) {
        let run_score = self.score.total_run_score;
        let session_total = self.score.session_total_score;
        let high_score_rank = self.ledger.record(self.mode, self.level_id, run_score);
        if let Some(rank) = high_score_rank {
            events.push(GameEvent::HighScore {
                level_id: self.level_id,
                score: run_score,
                rank,
            });
        }

        let stunts = self.stunts.unlock_by_score(session_total);
        if !stunts.is_empty() {
            info!("unlocked stunts: {}", stunts.join(", "));
            events.push(GameEvent::StuntsUnlocked(stunts));
        }
        let levels = self.levels.unlock_by_score(session_total);
        if !levels.is_empty() {
            info!("unlocked levels: {}", levels.join(", "));
            events.push(GameEvent::LevelsUnlocked(levels));
        }

        let next = self.levels.next_after(self.level_id);
        self.banked = Some(LevelSummary {
            mode: self.mode,
            level_id: self.level_id,
            run_score,
            session_total,
            falls: self.stats.falls,
            stunts_performed: self.stats.stunts,
            best_impact: self.stats.best_impact,
            targets_hit: self.targets_hit.clone(),
            high_score_rank,
            has_next_level: next.is_some(),
            next_level_unlocked: next.is_some_and(|level| level.unlocked),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyLabel;
    use crate::physics::testing::RecordingPhysics;
    use crate::storage::MemoryStorage;
    use Direction::{Down, Right, Up};
    use glam::Vec2;

    /// Units from the default spawn to the default ground line.
    const FULL_DROP: f32 = 39_850.0;

    fn session_on(level: u32) -> (GameSession<MemoryStorage>, RecordingPhysics) {
        let mut physics = RecordingPhysics::default();
        let mut session = GameSession::with_defaults(GameMode::Story, MemoryStorage::default());
        assert!(session.start_level(level, &mut physics));
        physics.clearance = 1_000.0;
        (session, physics)
    }

    fn contact(part: BodyPart, other: BodyLabel, speed: f32) -> CollisionEvent {
        CollisionEvent::new(BodyLabel::Character(part), other, Vec2::new(0.0, -speed))
    }

    fn ground_hit(speed: f32) -> CollisionEvent {
        contact(BodyPart::Groin, BodyLabel::Ground, speed)
    }

    /// Spawn at y=100, drop `units` and leave the torso there still falling.
    fn drop_by(
        session: &mut GameSession<MemoryStorage>,
        physics: &mut RecordingPhysics,
        units: f32,
    ) {
        physics.set_torso(Vec2::new(400.0, 100.0), Vec2::new(0.0, 5.0));
        let events = session.tick(0, 0.016, physics);
        assert_eq!(events, vec![GameEvent::FallStarted { origin_y: 100.0 }]);
        physics.set_torso(Vec2::new(400.0, 100.0 + units), Vec2::new(0.0, 12.0));
        session.tick(50, 0.016, physics);
    }

    fn completed(events: &[GameEvent]) -> Vec<&LevelSummary> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::LevelCompleted(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn stunt_then_impact_scores_with_level_multiplier() {
        let (mut session, mut physics) = session_on(2);
        drop_by(&mut session, &mut physics, 2_500.0);

        let mut fired = Vec::new();
        for (t, symbol) in [(100, Up), (200, Down)] {
            fired.extend(session.on_key(symbol, t, &mut physics));
        }
        assert!(matches!(
            fired.as_slice(),
            [GameEvent::StuntPerformed(outcome)] if outcome.name == "Backflip"
        ));
        assert_eq!(physics.spins, vec![(BodyPart::Torso, -0.2)]);

        let events = session.on_collision(&ground_hit(10.0), 400, &physics);
        // 50m fall: force 50, raw score floor(50 * 1.3 * 2) = 130, level x1.5
        assert!(matches!(
            events.as_slice(),
            [GameEvent::Impact { report, awarded: 195 }] if report.score == 130
        ));
        assert_eq!(session.score().total_run_score, 195);
        assert_eq!(session.score().session_total_score, 195);

        // further contacts in the same fall do not score again
        assert!(session.on_collision(&ground_hit(30.0), 420, &physics).is_empty());
        assert_eq!(session.score().total_run_score, 195);
    }

    #[test]
    fn only_groin_contacts_score_impacts() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, 1_000.0);

        for part in [BodyPart::Torso, BodyPart::Head, BodyPart::LeftLeg] {
            let hit = contact(part, BodyLabel::Ground, 40.0);
            assert!(session.on_collision(&hit, 60, &physics).is_empty(), "{part:?}");
        }
        assert_eq!(session.score().total_run_score, 0);
        assert!(session.hud().impact_force.abs() < f64::EPSILON);

        // the fall's impact is still available to the groin
        let events = session.on_collision(&ground_hit(10.0), 70, &physics);
        assert!(matches!(events.as_slice(), [GameEvent::Impact { awarded, .. }] if *awarded > 0));
    }

    #[test]
    fn target_contact_while_falling_also_scores_impact() {
        let (mut session, mut physics) = session_on(3);
        drop_by(&mut session, &mut physics, 1_800.0);
        let billboard = contact(
            BodyPart::Groin,
            BodyLabel::Target("billboard".into()),
            20.0,
        );
        let events = session.on_collision(&billboard, 100, &physics);
        // 36m fall: force 72, raw floor(72 * 1.72) = 123, level x2
        assert_eq!(events.len(), 2, "{events:?}");
        assert_eq!(events[0], GameEvent::TargetHit {
            id: "billboard".into(),
            points: 2_000,
        });
        assert!(matches!(
            &events[1],
            GameEvent::Impact { report, awarded: 246 } if report.score == 123
        ));
        assert_eq!(session.score().total_run_score, 2_246);
        assert!(session.completion() == LevelCompletion::Idle);
    }

    #[test]
    fn landing_resets_fall_and_reports_summary() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, 400.0);
        session.on_collision(&ground_hit(6.0), 60, &physics);

        physics.set_torso(Vec2::new(400.0, 500.0), Vec2::ZERO);
        physics.clearance = 1.0;
        let events = session.tick(100, 0.016, &physics);
        let [GameEvent::Landed(summary)] = events.as_slice() else {
            panic!("expected a landing, got {events:?}");
        };
        assert!((summary.max_height - 8.0).abs() < f32::EPSILON);
        assert!(summary.impact_force > 0.0);
        let hud = session.hud();
        assert!(!hud.airborne);
        assert!((hud.stunt_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(hud.performed_stunts.is_empty());
    }

    #[test]
    fn grounded_contacts_score_nothing() {
        let (mut session, physics) = session_on(1);
        let events = session.on_collision(&ground_hit(50.0), 10, &physics);
        assert!(events.is_empty());
        assert_eq!(session.score().total_run_score, 0);
    }

    #[test]
    fn targets_award_once_per_attempt() {
        let (mut session, mut physics) = session_on(3);
        let billboard = CollisionEvent::new(
            BodyLabel::Target("billboard".into()),
            BodyLabel::Character(BodyPart::Head),
            Vec2::new(3.0, 4.0),
        );
        let first = session.on_collision(&billboard, 10, &physics);
        assert_eq!(first, vec![GameEvent::TargetHit {
            id: "billboard".into(),
            points: 2_000
        }]);
        assert!(session.on_collision(&billboard, 20, &physics).is_empty());
        assert_eq!(session.score().total_run_score, 2_000);

        let stray = CollisionEvent::new(
            BodyLabel::Target("crane".into()),
            BodyLabel::Character(BodyPart::Head),
            Vec2::ZERO,
        );
        assert!(session.on_collision(&stray, 30, &physics).is_empty());

        assert!(session.restart_level(&mut physics));
        assert_eq!(session.score(), ScoreRecord::default());
        assert!(session.targets_hit().is_empty());
        assert_eq!(session.on_collision(&billboard, 40, &physics).len(), 1);
    }

    #[test]
    fn limb_on_limb_contacts_are_ignored() {
        let (mut session, physics) = session_on(1);
        let event = CollisionEvent::new(
            BodyLabel::Character(BodyPart::LeftArm),
            BodyLabel::Character(BodyPart::Groin),
            Vec2::new(0.0, 40.0),
        );
        assert!(session.on_collision(&event, 0, &physics).is_empty());
    }

    #[test]
    fn completion_banks_the_run_when_triggered() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, FULL_DROP);
        let events = session.on_collision(&ground_hit(5.0), 1_000, &physics);
        // 797m fall: force 398.5, floor(398.5 * 16.94) = 6750
        let run_score = session.score().total_run_score;
        assert_eq!(run_score, 6_750);
        assert!(events.contains(&GameEvent::LevelCompletePending { fire_at_ms: 4_000 }));
        assert!(events.contains(&GameEvent::HighScore {
            level_id: 1,
            score: run_score,
            rank: 1,
        }));
        assert!(events.contains(&GameEvent::StuntsUnlocked(vec![
            "Double Backflip".to_string(),
            "Double Frontflip".to_string(),
        ])));
        assert!(events.contains(&GameEvent::LevelsUnlocked(vec![
            "Mountain Peak".to_string(),
            "City Rooftops".to_string(),
        ])));
        assert_eq!(session.ledger().storage().save_count(), 1);

        // the run is frozen until the summary fires
        assert!(session.on_collision(&ground_hit(5.0), 1_500, &physics).is_empty());
        assert!(completed(&session.tick(3_999, 0.016, &physics)).is_empty());

        let events = session.tick(4_000, 0.016, &physics);
        let summaries = completed(&events);
        assert_eq!(summaries.len(), 1);
        let summary = summaries[0];
        assert_eq!(summary.level_id, 1);
        assert_eq!(summary.run_score, run_score);
        assert_eq!(summary.session_total, run_score);
        assert_eq!(summary.falls, 1);
        assert_eq!(summary.high_score_rank, Some(1));
        assert!(summary.has_next_level);
        assert!(summary.next_level_unlocked);
        assert_eq!(events.len(), 1);
        assert_eq!(session.ledger().storage().save_count(), 1);

        for t in [4_100, 9_000, 20_000] {
            assert!(completed(&session.tick(t, 0.016, &physics)).is_empty());
        }
    }

    #[test]
    fn restart_after_trigger_keeps_banked_points() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, FULL_DROP);
        session.on_collision(&ground_hit(20.0), 1_000, &physics);
        assert!(session.completion().is_pending());
        let banked = session.score().session_total_score;
        assert!(banked > 0);

        assert!(session.restart_level(&mut physics));
        assert_eq!(session.completion(), LevelCompletion::Idle);
        assert_eq!(physics.resets.len(), 2);
        assert!(session.tick(5_000, 0.016, &physics).is_empty());
        assert_eq!(session.score().total_run_score, 0);
        assert_eq!(session.score().session_total_score, banked);
    }

    #[test]
    fn abandoning_an_attempt_withdraws_its_points() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, 1_000.0);
        session.on_collision(&ground_hit(10.0), 100, &physics);
        assert!(session.score().session_total_score > 0);

        assert!(session.restart_level(&mut physics));
        assert_eq!(session.score(), ScoreRecord::default());
    }

    #[test]
    fn next_level_keeps_completed_points() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, FULL_DROP);
        session.on_collision(&ground_hit(20.0), 1_000, &physics);
        session.tick(4_000, 0.016, &physics);
        let banked = session.score().session_total_score;
        assert!(banked > 0);

        assert!(session.next_level(&mut physics));
        assert_eq!(session.level_id(), 2);
        assert_eq!(session.score().total_run_score, 0);
        assert_eq!(session.score().session_total_score, banked);

        assert!(session.start_level(3, &mut physics));
        assert!(!session.next_level(&mut physics));
        assert!(!session.start_level(99, &mut physics));
        assert_eq!(session.level_id(), 3);
    }

    #[test]
    fn next_level_stays_put_while_locked() {
        let (mut session, mut physics) = session_on(1);
        assert!(!session.next_level(&mut physics));
        assert_eq!(session.level_id(), 1);
        assert_eq!(physics.resets.len(), 1);
    }

    #[test]
    fn next_level_unlocks_once_the_session_total_suffices() {
        let (mut session, mut physics) = session_on(2);
        drop_by(&mut session, &mut physics, 1_000.0);
        session.on_collision(&ground_hit(10.0), 100, &physics);
        // 20m fall: force 20, floor(20 * 1.4) = 28, level x1.5
        assert_eq!(session.score().session_total_score, 42);

        assert!(session.next_level(&mut physics));
        assert_eq!(session.level_id(), 3);
        assert!(session.level().is_some_and(|level| level.unlocked));
    }

    #[test]
    fn hud_tracks_combo_progress_and_easing() {
        let (mut session, mut physics) = session_on(1);
        drop_by(&mut session, &mut physics, 2_000.0);
        session.on_key(Up, 100, &mut physics);
        session.on_key(Right, 200, &mut physics);
        let hud = session.hud();
        assert_eq!(hud.combo.symbols, vec![Up, Right]);
        assert_eq!(hud.combo.time_remaining_ms, 1_000);
        assert!(hud.airborne);
        assert!((hud.current_height - 40.0).abs() < f32::EPSILON);

        session.on_collision(&ground_hit(10.0), 250, &physics);
        let target = session.score().total_run_score;
        assert!(target > 0);
        session.tick(300, 0.016, &physics);
        assert!(session.hud().displayed_score < target);
        for step in 0..300 {
            session.tick(300 + step * 16, 0.016, &physics);
        }
        assert_eq!(session.hud().displayed_score, target);
    }
}
