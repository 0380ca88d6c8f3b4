use anyhow::Result;
use ragfall_game::{Direction, GameEvent, GameMode};

use super::plan::{Action, SimulationPlan, SimulationSummary};
use Direction::{Down, Up};

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const BACKFLIP: [Direction; 2] = [Up, Down];
const FRONTFLIP: [Direction; 2] = [Down, Up];

fn landed_and_scored(summary: &SimulationSummary) -> Result<()> {
    let awards = summary.impact_awards();
    anyhow::ensure!(!awards.is_empty(), "a plain drop should score an impact");
    anyhow::ensure!(awards[0] > 0, "first impact scored {} points", awards[0]);
    anyhow::ensure!(
        summary.count(|event| matches!(event, GameEvent::Landed(_))) > 0,
        "the ragdoll never landed"
    );
    Ok(())
}

fn stunts_exactly(
    expected: &'static [&'static str],
) -> impl Fn(&SimulationSummary) -> Result<()> {
    move |summary| {
        let stunts = summary.stunts();
        anyhow::ensure!(
            stunts == expected,
            "expected stunts {expected:?}, got {stunts:?}"
        );
        Ok(())
    }
}

fn first_impact_multiplier(expected: f64) -> impl Fn(&SimulationSummary) -> Result<()> {
    move |summary| {
        let multiplier = summary.events().find_map(|event| match event {
            GameEvent::Impact { report, .. } => Some(report.stunt_multiplier),
            _ => None,
        });
        anyhow::ensure!(
            multiplier.is_some_and(|m| (m - expected).abs() < 1e-9),
            "expected the first impact at x{expected}, got {multiplier:?}"
        );
        Ok(())
    }
}

fn billboard_scored_once(summary: &SimulationSummary) -> Result<()> {
    let hits: Vec<_> = summary
        .events()
        .filter_map(|event| match event {
            GameEvent::TargetHit { id, points } => Some((id.as_str(), *points)),
            _ => None,
        })
        .collect();
    anyhow::ensure!(hits == [("billboard", 2_000)], "unexpected target hits {hits:?}");
    anyhow::ensure!(
        summary.score.total_run_score >= 2_000,
        "run score {} is missing the billboard bonus",
        summary.score.total_run_score
    );
    Ok(())
}

fn completes_once(summary: &SimulationSummary) -> Result<()> {
    let fire_at = summary.events.iter().rev().find_map(|(_, event)| match event {
        GameEvent::LevelCompletePending { fire_at_ms } => Some(*fire_at_ms),
        _ => None,
    });
    let completions: Vec<_> = summary
        .events
        .iter()
        .filter_map(|(at_ms, event)| match event {
            GameEvent::LevelCompleted(level) => Some((*at_ms, level)),
            _ => None,
        })
        .collect();
    let [(completed_at, level)] = completions.as_slice() else {
        anyhow::bail!("expected one completion, got {}", completions.len());
    };
    let fire_at = fire_at.ok_or_else(|| anyhow::anyhow!("completion was never scheduled"))?;
    anyhow::ensure!(
        *completed_at >= fire_at,
        "completed at {completed_at}ms before its {fire_at}ms deadline"
    );
    anyhow::ensure!(
        level.run_score == summary.score.total_run_score,
        "summary run score {} differs from session {}",
        level.run_score,
        summary.score.total_run_score
    );
    if let Some(rank) = level.high_score_rank {
        anyhow::ensure!(
            summary.high_scores.get(rank - 1) == Some(&level.run_score),
            "rank {rank} does not hold {} in {:?}",
            level.run_score,
            summary.high_scores
        );
    }
    Ok(())
}

fn restart_withdraws_abandoned_run(summary: &SimulationSummary) -> Result<()> {
    let awards = summary.impact_awards();
    anyhow::ensure!(
        awards.len() >= 2,
        "expected impacts before and after the restart, got {awards:?}"
    );
    anyhow::ensure!(
        summary.score.session_total_score == summary.score.total_run_score,
        "session total {} still holds the abandoned run (run {})",
        summary.score.session_total_score,
        summary.score.total_run_score
    );
    Ok(())
}

fn stayed_grounded(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(!summary.hud.airborne, "the ragdoll should have settled");
    Ok(())
}

pub fn get_scenario(name: &str, mode: GameMode) -> Option<TestScenario> {
    let base = SimulationPlan::new(mode, 1);
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::simulation(
            "Smoke Test",
            base.with_duration(4_000).with_expectation(landed_and_scored),
        ),
        "stunt-combo" | "combo" => TestScenario::simulation(
            "Stunt Combo",
            base.with_keys(200, 100, &BACKFLIP)
                .with_expectation(stunts_exactly(&["Backflip"]))
                .with_expectation(first_impact_multiplier(1.3)),
        ),
        "repeat-combo" | "repeat" => TestScenario::simulation(
            "Repeated Combo In One Fall",
            base.with_keys(200, 100, &[Up, Down, Up, Down, Up, Down])
                .with_expectation(stunts_exactly(&["Backflip"])),
        ),
        "grounded-combo" | "grounded" => TestScenario::simulation(
            "Grounded Combo",
            base.with_duration(6_000)
                .with_keys(5_000, 100, &BACKFLIP)
                .with_expectation(stunts_exactly(&[]))
                .with_expectation(stayed_grounded),
        ),
        "stale-gap" | "gap" => TestScenario::simulation(
            "Stale Combo Gap",
            base.with_keys(200, 0, &[Up])
                .with_keys(1_500, 0, &[Down])
                .with_expectation(stunts_exactly(&[])),
        ),
        "stacked-stunts" | "stacked" => TestScenario::simulation(
            "Stacked Stunts",
            base.with_keys(200, 100, &BACKFLIP)
                .with_keys(600, 100, &FRONTFLIP)
                .with_expectation(stunts_exactly(&["Backflip", "Frontflip"]))
                .with_expectation(first_impact_multiplier(1.6)),
        ),
        "target-bonus" | "target" => TestScenario::simulation(
            "Target Bonus",
            SimulationPlan::new(mode, 3)
                .with_target("billboard", 1_900.0)
                .with_expectation(billboard_scored_once),
        ),
        "level-complete" | "complete" => TestScenario::simulation(
            "Level Complete",
            base.with_expectation(landed_and_scored)
                .with_expectation(completes_once),
        ),
        "restart-run" | "restart" => TestScenario::simulation(
            "Restart Mid-Run",
            base.with_duration(9_000)
                .with_target("ledge", 10_000.0)
                .with_action(1_500, Action::RestartLevel)
                .with_expectation(restart_withdraws_abandoned_run)
                .with_expectation(completes_once),
        ),
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("stunt-combo", "Stunt Combo"),
        ("repeat-combo", "Repeated Combo In One Fall"),
        ("grounded-combo", "Grounded Combo"),
        ("stale-gap", "Stale Combo Gap"),
        ("stacked-stunts", "Stacked Stunts"),
        ("target-bonus", "Target Bonus"),
        ("level-complete", "Level Complete"),
        ("restart-run", "Restart Mid-Run"),
    ]
}
