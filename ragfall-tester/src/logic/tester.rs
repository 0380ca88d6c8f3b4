use colored::Colorize;
use ragfall_game::{FileStorage, MemoryStorage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::plan::{SimulationSummary, TesterAssets, run_plan};
use super::scenarios::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    assets: TesterAssets,
    highscores: Option<PathBuf>,
}

impl LogicTester {
    pub const fn new(assets: TesterAssets, verbose: bool) -> Self {
        Self {
            verbose,
            assets,
            highscores: None,
        }
    }

    /// Persist every run's high scores to `path` instead of a throwaway table.
    #[must_use]
    pub fn with_highscores(mut self, path: Option<PathBuf>) -> Self {
        self.highscores = path;
        self
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (mode: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.mode,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(scenario, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = self
                .simulate(scenario, iteration_seed)
                .and_then(|summary| evaluate_expectations(scenario, &summary).map(|()| summary));

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);

                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) seed:{} score:{} stunts:{}",
                            i + 1,
                            iterations,
                            summary.seed,
                            summary.score.total_run_score,
                            summary.stunts().join("+")
                        );
                    }
                }
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (mode {}, level {}, seed {}): {err:#}",
                        i + 1,
                        scenario.plan.mode,
                        scenario.plan.level_id,
                        iteration_seed
                    ));

                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                }
            }
        }

        (successes, failures, performance_data)
    }

    fn simulate(&self, scenario: &TestScenario, seed: u64) -> anyhow::Result<SimulationSummary> {
        match &self.highscores {
            Some(path) => run_plan(&self.assets, &scenario.plan, seed, FileStorage::new(path)),
            None => run_plan(
                &self.assets,
                &scenario.plan,
                seed,
                MemoryStorage::default(),
            ),
        }
    }
}

fn evaluate_expectations(
    scenario: &TestScenario,
    summary: &SimulationSummary,
) -> anyhow::Result<()> {
    for expectation in &scenario.plan.expectations {
        expectation.evaluate(summary)?;
    }
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
