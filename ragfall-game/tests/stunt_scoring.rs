use glam::Vec2;
use ragfall_game::{
    BodyLabel, BodyPart, BodyState, CollisionEvent, ComboRecognizer, Direction, FallState,
    GameEvent, GameMode, GameSession, MemoryStorage, PhysicsBackend, StuntCatalog, TuningConfig,
    calculate_impact, calculate_score,
};

use Direction::{Down, Left, Right, Up};

/// Floor of the built-in levels.
const GROUND_Y: f32 = 39_950.0;

/// Single-body stand-in for the simulator: the torso moves where the test puts it.
#[derive(Debug, Default)]
struct Shaft {
    ground_y: f32,
    torso: BodyState,
    impulses: usize,
    spins: usize,
    angles: usize,
}

impl Shaft {
    fn new(ground_y: f32) -> Self {
        Self {
            ground_y,
            ..Self::default()
        }
    }

    fn place(&mut self, y: f32, vy: f32) {
        self.torso.position = Vec2::new(400.0, y);
        self.torso.velocity = Vec2::new(1.0, vy);
    }
}

impl PhysicsBackend for Shaft {
    fn body_state(&self, part: BodyPart) -> Option<BodyState> {
        (part == BodyPart::Torso).then_some(self.torso)
    }

    fn ground_clearance(&self) -> f32 {
        (self.ground_y - self.torso.position.y).max(0.0)
    }

    fn apply_impulse(&mut self, _part: BodyPart, _impulse: Vec2) {
        self.impulses += 1;
    }

    fn set_angular_velocity(&mut self, _part: BodyPart, _angular_velocity: f32) {
        self.spins += 1;
    }

    fn set_angle(&mut self, _part: BodyPart, angle: f32) {
        self.torso.angle = angle;
        self.angles += 1;
    }

    fn reset_world(&mut self, spawn: Vec2) {
        self.torso = BodyState {
            position: spawn,
            ..BodyState::default()
        };
    }
}

fn ground_hit(speed: f32) -> CollisionEvent {
    CollisionEvent::new(
        BodyLabel::Ground,
        BodyLabel::Character(BodyPart::Groin),
        Vec2::new(0.0, speed),
    )
}

fn stunts_in(events: &[GameEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::StuntPerformed(outcome) => Some(outcome.name.clone()),
            _ => None,
        })
        .collect()
}

fn started_session() -> (GameSession<MemoryStorage>, Shaft) {
    let mut session = GameSession::with_defaults(GameMode::Story, MemoryStorage::default());
    let mut shaft = Shaft::new(GROUND_Y);
    assert!(session.start_level(1, &mut shaft));
    (session, shaft)
}

#[test]
fn trailing_match_fires_once_and_empties_buffer() {
    let cfg = TuningConfig::default();
    let catalog = StuntCatalog::default_catalog();
    let leads = [[Left, Left], [Down, Left], [Right, Right]];
    for lead in leads {
        let mut combo = ComboRecognizer::new(&cfg);
        let mut fired = Vec::new();
        let sequence = lead.iter().chain([Up, Down].iter());
        for (i, &symbol) in sequence.enumerate() {
            let t = 900 * u64::try_from(i).unwrap();
            if let Some(name) = combo.submit(symbol, t, true, &catalog) {
                fired.push(name);
                assert!(combo.is_empty());
            }
        }
        assert_eq!(fired, vec!["Backflip".to_string()], "lead {lead:?}");
    }
}

#[test]
fn grounded_character_never_stunts() {
    let (mut session, mut shaft) = started_session();
    let mut events = Vec::new();
    for (i, symbol) in [Up, Right, Down, Up, Left, Down, Down, Down, Down]
        .into_iter()
        .enumerate()
    {
        events.extend(session.on_key(symbol, 100 * u64::try_from(i).unwrap(), &mut shaft));
    }
    assert!(stunts_in(&events).is_empty());
    assert_eq!(shaft.spins, 0);
    assert_eq!(shaft.impulses, 0);
    assert_eq!(shaft.angles, 0);
}

#[test]
fn combo_started_grounded_completes_in_the_air() {
    let (mut session, mut shaft) = started_session();
    session.on_key(Left, 0, &mut shaft);
    session.on_key(Up, 100, &mut shaft);

    shaft.place(130.0, 4.0);
    session.tick(150, 0.016, &shaft);
    let events = session.on_key(Down, 200, &mut shaft);
    assert_eq!(stunts_in(&events), vec!["Backflip".to_string()]);
}

#[test]
fn same_combo_twice_in_one_fall_triggers_once_then_again_next_fall() {
    let (mut session, mut shaft) = started_session();
    shaft.place(100.0, 4.0);
    session.tick(0, 0.016, &shaft);

    let mut events = Vec::new();
    for (t, symbol) in [(100, Up), (200, Down), (300, Up), (400, Down)] {
        events.extend(session.on_key(symbol, t, &mut shaft));
    }
    assert_eq!(stunts_in(&events), vec!["Backflip".to_string()]);
    assert!((session.hud().stunt_multiplier - 1.3).abs() < 1e-9);

    shaft.place(GROUND_Y - 3.0, 0.0);
    session.tick(700, 0.016, &shaft);
    assert!(!session.hud().airborne);

    shaft.place(GROUND_Y - 3.0, 3.0);
    session.tick(800, 0.016, &shaft);
    shaft.place(GROUND_Y - 2.0, 3.0);
    let mut events = Vec::new();
    for (t, symbol) in [(900, Up), (1_000, Down)] {
        events.extend(session.on_key(symbol, t, &mut shaft));
    }
    assert_eq!(stunts_in(&events), vec!["Backflip".to_string()]);
}

#[test]
fn landing_always_resets_fall_state() {
    let cfg = TuningConfig::default();
    let (mut session, mut shaft) = started_session();
    for (round, depth) in [300.0_f32, 6_000.0, 20_000.0, 39_000.0].into_iter().enumerate() {
        let t = 10_000 * u64::try_from(round).unwrap();
        shaft.place(100.0, 5.0);
        session.tick(t, 0.016, &shaft);
        for (dt, symbol) in [(100, Up), (200, Down), (300, Down), (400, Up)] {
            session.on_key(symbol, t + dt, &mut shaft);
        }
        shaft.place(100.0 + depth, 9.0);
        session.tick(t + 700, 0.016, &shaft);
        assert!(session.hud().stunt_multiplier > 1.0);

        shaft.place(GROUND_Y - 1.0, 0.0);
        session.tick(t + 800, 0.016, &shaft);
        let fall = &session.character().fall;
        assert!(fall.performed_stunts.is_empty());
        assert!((fall.stunt_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(fall.max_height_this_fall.abs() < f32::EPSILON);
        assert!(FallState::is_near_ground_y(shaft.torso.position.y, GROUND_Y, &cfg));
    }
}

#[test]
fn gap_longer_than_window_breaks_the_combo() {
    let cfg = TuningConfig::default();
    let catalog = StuntCatalog::default_catalog();
    let mut combo = ComboRecognizer::new(&cfg);
    assert!(combo.submit(Up, 0, true, &catalog).is_none());
    assert!(combo.submit(Right, 1_000, true, &catalog).is_none());
    assert!(combo.submit(Down, 2_001, true, &catalog).is_none());
    assert_eq!(combo.symbols().as_slice(), &[Down]);
}

#[test]
fn impact_formulas_match_reference_values() {
    assert!((calculate_impact(10.0, 50.0) - 50.0).abs() < f64::EPSILON);
    assert_eq!(calculate_score(50.0, 1.5, 50.0), 150);
    assert_eq!(calculate_score(calculate_impact(25.0, 0.0), 3.0, 0.0), 0);
}

#[test]
fn zero_height_collision_scores_nothing() {
    let (mut session, mut shaft) = started_session();
    shaft.place(100.0, 2.0);
    session.tick(0, 0.016, &shaft);
    let events = session.on_collision(&ground_hit(40.0), 10, &shaft);
    assert!(matches!(
        events.as_slice(),
        [GameEvent::Impact { awarded: 0, .. }]
    ));
    assert_eq!(session.score().total_run_score, 0);
}

#[test]
fn full_drop_to_completion() {
    let (mut session, mut shaft) = started_session();
    let mut events = Vec::new();
    shaft.place(100.0, 3.0);
    events.extend(session.tick(0, 0.016, &shaft));
    for (t, symbol) in [(100, Up), (200, Down)] {
        events.extend(session.on_key(symbol, t, &mut shaft));
    }
    assert_eq!(stunts_in(&events), vec!["Backflip".to_string()]);
    shaft.place(GROUND_Y - 10.0, 14.0);
    events.extend(session.tick(1_200, 0.016, &shaft));
    events.extend(session.on_collision(&ground_hit(14.0), 1_210, &shaft));
    shaft.place(GROUND_Y - 4.0, 0.0);
    events.extend(session.tick(1_300, 0.016, &shaft));
    for step in 0..80_u64 {
        events.extend(session.tick(1_300 + step * 50, 0.05, &shaft));
    }

    let completed: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, GameEvent::LevelCompleted(_)))
        .collect();
    assert_eq!(completed.len(), 1);
    assert!(events.contains(&GameEvent::LevelCompletePending { fire_at_ms: 4_210 }));
    assert!(events.iter().any(|event| matches!(event, GameEvent::Landed(_))));
    let best = session.ledger().top(GameMode::Story, 1)[0];
    assert!(best > 0);
    assert!(completed.iter().any(
        |event| matches!(event, GameEvent::LevelCompleted(summary) if summary.run_score == best)
    ));
    assert_eq!(session.hud().displayed_score, session.score().total_run_score);
}

#[test]
fn groin_torpedo_snaps_the_torso_upside_down() {
    let cfg = TuningConfig::default();
    let mut shaft = Shaft::new(GROUND_Y);
    let mut catalog = StuntCatalog::default_catalog();
    catalog.unlock_by_score(25_000);
    let mut fall = FallState::default();
    fall.begin_fall(0, 100.0);
    let outcome = catalog
        .trigger("Groin Torpedo", &mut fall, cfg.stacking, &mut shaft)
        .unwrap();
    assert!((outcome.stunt_multiplier - 2.5).abs() < 1e-9);
    assert!((shaft.torso.angle - std::f32::consts::PI).abs() < f32::EPSILON);
    assert_eq!(shaft.angles, 1);
    assert_eq!(shaft.spins, 0);
    assert_eq!(shaft.impulses, 6);
}
