mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use ragfall_game::{BuiltinContent, DirContent, GameMode};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{LogicTester, TesterAssets, get_scenario, list_scenarios};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "ragfall-tester", version = "0.1.0")]
#[command(about = "Headless scenario runner for the Ragfall stunt and scoring core")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Play mode the scenarios run under
    #[arg(long, default_value = "story")]
    #[arg(value_parser = ["story", "challenge"])]
    mode: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist high scores to this file instead of a throwaway table
    #[arg(long)]
    highscores: Option<PathBuf>,

    /// Directory holding stunts.json, levels.json and tuning.json overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let mode = parse_mode(&args.mode)?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&args.seeds)?;
    let assets = load_assets(&args)?;
    let tester = LogicTester::new(assets, args.verbose).with_highscores(args.highscores.clone());

    let results = run_logic_scenarios(&args, &tester, &scenarios, &seeds, mode);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🪂 Ragfall Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn parse_mode(raw: &str) -> Result<GameMode> {
    raw.parse::<GameMode>()
        .map_err(|()| anyhow::anyhow!("unknown mode '{raw}'"))
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(raw)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!seeds.is_empty(), "at least one seed is required");
    Ok(seeds)
}

fn load_assets(args: &Args) -> Result<TesterAssets> {
    match &args.config {
        Some(dir) => TesterAssets::load(&DirContent::new(dir))
            .with_context(|| format!("loading content from {}", dir.display())),
        None => TesterAssets::load(&BuiltinContent),
    }
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        scenarios.extend(list_scenarios().into_iter().map(|(key, _)| key.to_string()));
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    tester: &LogicTester,
    scenarios: &[String],
    seeds: &[u64],
    mode: GameMode,
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name, mode) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Ragfall Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            mode: "story".to_string(),
            report: "json".to_string(),
            output: None,
            highscores: None,
            config: None,
            verbose: false,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "ragfall-main-{label}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn all_expands_to_every_listed_scenario() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len() + 1);
        assert!(expanded.iter().any(|s| s == "level-complete"));
    }

    #[test]
    fn seeds_and_mode_parse_or_fail_loudly() {
        assert_eq!(parse_seeds("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_seeds("1,x").is_err());
        assert!(parse_seeds(" , ").is_err());
        assert_eq!(parse_mode("challenge").unwrap(), GameMode::Challenge);
        assert!(parse_mode("endless").is_err());
    }

    #[test]
    fn missing_config_directory_falls_back_to_builtins() {
        let mut args = base_args();
        args.config = Some(temp_path("no-such-dir"));
        let assets = load_assets(&args).unwrap();
        assert_eq!(assets.levels, TesterAssets::default().levels);
    }

    #[test]
    fn invalid_tuning_override_is_rejected() {
        let dir = temp_path("bad-tuning");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tuning.json"), r#"{ "combo_window_ms": 0 }"#).unwrap();
        let mut args = base_args();
        args.config = Some(dir.clone());
        assert!(load_assets(&args).is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn write_reports_emits_json_to_file() {
        let path = temp_path("report.json");
        let mut args = base_args();
        args.output = Some(path.clone());
        let tester = LogicTester::new(TesterAssets::default(), false);
        let scenarios = ["smoke".to_string()];
        let results = run_logic_scenarios(&args, &tester, &scenarios, &[1], GameMode::Story);
        write_reports(&args, &results, Instant::now()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["scenario_name"], "Smoke Test");
        assert_eq!(value[0]["passed"], true);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn list_scenarios_writes_to_output() {
        let path = temp_path("list.txt");
        let mut args = base_args();
        args.list_scenarios = true;
        args.output = Some(path.clone());
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Available scenarios:"));
        assert!(content.contains("stale-gap"));
        let _ = std::fs::remove_file(path);
    }
}
