//! Warcalc - Engagement tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warcalc_core::engagement::{DaySnapshot, Engagement};
use warcalc_core::report::EngagementReport;
use warcalc_tools::{
    batch::run_directory,
    chart::{render_troop_chart, ChartConfig},
    scenario::BattleScenario,
    validate::validate_scenario_directory,
};

#[derive(Parser)]
#[command(name = "warcalc-tools")]
#[command(about = "Resolve and inspect wargame engagements")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single engagement
    Run {
        /// Scenario file (defaults to the built-in hill offensive)
        scenario: Option<PathBuf>,

        /// Override the scenario horizon in days
        #[arg(long)]
        days: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Draw the troop curves
        #[arg(long)]
        chart: bool,

        /// Print every simulated day
        #[arg(long)]
        daily: bool,
    },

    /// Resolve every scenario in a directory in parallel
    Batch {
        /// Scenario directory
        #[arg(default_value = "scenarios")]
        dir: PathBuf,

        /// Write results as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate scenario files
    Validate {
        /// Path to scenario directory
        #[arg(default_value = "scenarios")]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            days,
            json,
            chart,
            daily,
        } => run_scenario(scenario.as_deref(), days, json, chart, daily),
        Commands::Batch { dir, output } => run_batch(&dir, output.as_deref()),
        Commands::Validate { path } => validate(&path),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn run_scenario(
    path: Option<&Path>,
    days: Option<u32>,
    json: bool,
    chart: bool,
    daily: bool,
) -> CliResult {
    let mut scenario = match path {
        Some(path) => BattleScenario::load(path)?,
        None => BattleScenario::hill_offensive(),
    };
    if let Some(days) = days {
        scenario.horizon_days = days;
    }
    tracing::info!("Resolving '{}' over {} days", scenario.name, scenario.horizon_days);

    let mut engagement = Engagement::new(scenario.params()?)?;
    while let Some(snapshot) = engagement.tick() {
        if daily {
            print_day(&snapshot);
        }
    }
    let report = engagement
        .report()
        .ok_or("engagement stopped without a verdict")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    if chart {
        println!();
        print!("{}", render_troop_chart(&report, &ChartConfig::default()));
    }
    Ok(())
}

fn print_day(day: &DaySnapshot) {
    println!(
        "day {:>3}: attacker {:>9.0} (-{:.0}) rate {:.5} | defender {:>9.0} (-{:.0}) rate {:.5}",
        day.day,
        day.attacker_troops,
        day.attacker_day_loss,
        day.attacker_rate,
        day.defender_troops,
        day.defender_day_loss,
        day.defender_rate,
    );
}

fn print_report(report: &EngagementReport) {
    println!("{report}");
    if let Some(winner) = report.outcome.winner() {
        println!("The {winner} holds the field.");
    }
    println!(
        "Ended after {} day(s) ({:?})",
        report.duration + 1,
        report.termination
    );
}

fn run_batch(dir: &Path, output: Option<&Path>) -> CliResult {
    let results = run_directory(dir)?;

    for run in &results.runs {
        println!(
            "{:<24} {:<32} day {:>3}",
            run.name,
            run.report.outcome.to_string(),
            run.report.duration
        );
    }
    for error in &results.errors {
        eprintln!("FAILED {}: {}", error.source.display(), error.message);
    }

    let summary = results.summary;
    println!(
        "\n{} engagements: {} attacker defeats, {} defender defeats, {} draws",
        summary.total(),
        summary.attacker_defeats,
        summary.defender_defeats,
        summary.draws
    );

    if let Some(path) = output {
        results.save(path)?;
        tracing::info!("Results saved to {}", path.display());
    }
    if results.errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} scenarios failed", results.errors.len()).into())
    }
}

fn validate(path: &Path) -> CliResult {
    tracing::info!("Validating scenario files in: {}", path.display());
    let report = validate_scenario_directory(path)?;
    if report.is_ok() {
        tracing::info!("Validation passed: {} scenarios", report.valid.len());
        Ok(())
    } else {
        let total = report.failures.len() + report.valid.len();
        Err(format!("Validation failed: {} of {total} files", report.failures.len()).into())
    }
}
