//! Headless fleet decision runner.
//!
//! This binary feeds one frozen turn to the decision engine and prints the
//! host-shaped actions. Designed for bot debugging, CI testing, and
//! determinism verification.
//!
//! # Usage
//!
//! ```bash
//! # Decide the built-in opening turn
//! cargo run -p harvest_headless -- decide --scenario opening
//!
//! # Decide a scenario file with a tuned engine, 5 consecutive turns
//! cargo run -p harvest_headless -- decide --scenario turn.ron --config engine.ron --turns 5
//!
//! # Check seeded reruns agree
//! cargo run -p harvest_headless -- verify --scenario midgame --runs 10 --seed 3
//!
//! # Print the default engine configuration as RON
//! cargo run -p harvest_headless -- default-config
//! ```
//!
//! # Output
//!
//! Output (stdout): JSON records, one per line
//! Logs (stderr): Debug information

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harvest_core::config::EngineConfig;
use harvest_headless::{
    protocol::Output,
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::{load_config, Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "harvest_headless")]
#[command(about = "Headless fleet decision runner for bot testing and CI")]
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
    /// Decide actions for a scenario turn
    Decide {
        /// Preset name (opening, midgame) or RON scenario file
        #[arg(short, long, default_value = "opening")]
        scenario: String,

        /// Engine configuration RON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tie-break seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Consecutive turns to decide on the same board
        #[arg(short, long, default_value = "1")]
        turns: u32,
    },

    /// Verify that seeded reruns produce identical decisions
    Verify {
        /// Preset name (opening, midgame) or RON scenario file
        #[arg(short, long, default_value = "opening")]
        scenario: String,

        /// Engine configuration RON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tie-break seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of reruns to compare
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Turns per rerun
        #[arg(short, long, default_value = "10")]
        turns: u32,
    },

    /// Print the default engine configuration as RON
    DefaultConfig,

    /// Print a preset scenario as RON, as a starting point for new files
    ScenarioTemplate {
        /// Preset name (opening, midgame)
        #[arg(default_value = "opening")]
        preset: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for JSON output)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Decide {
            scenario,
            config,
            seed,
            turns,
        } => cmd_decide(&scenario, config, seed, turns),
        Commands::Verify {
            scenario,
            config,
            seed,
            runs,
            turns,
        } => cmd_verify(&scenario, config, seed, runs, turns),
        Commands::DefaultConfig => cmd_default_config(),
        Commands::ScenarioTemplate { preset } => cmd_scenario_template(&preset),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            print!(
                "{}",
                Output::Error {
                    message: e.to_string()
                }
                .to_json_line()
            );
            ExitCode::FAILURE
        }
    }
}

fn runner(config: Option<PathBuf>, seed: u64, turns: u32) -> Result<HeadlessRunner, ScenarioError> {
    let engine = match config {
        Some(path) => {
            tracing::info!("Loading engine config: {}", path.display());
            load_config(&path)?
        }
        None => EngineConfig::default(),
    };
    Ok(HeadlessRunner::with_config(HeadlessConfig {
        engine,
        seed,
        turns,
    }))
}

/// Decide and print every requested turn
fn cmd_decide(
    scenario: &str,
    config: Option<PathBuf>,
    seed: u64,
    turns: u32,
) -> Result<ExitCode, ScenarioError> {
    let scenario = Scenario::resolve(scenario)?;
    let runner = runner(config, seed, turns)?;
    for output in runner.decide(&scenario)? {
        print!("{}", Output::Turn(output).to_json_line());
    }
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism of seeded reruns
fn cmd_verify(
    scenario: &str,
    config: Option<PathBuf>,
    seed: u64,
    runs: u32,
    turns: u32,
) -> Result<ExitCode, ScenarioError> {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs, {} turns)",
        scenario,
        seed,
        runs,
        turns
    );

    let scenario = Scenario::resolve(scenario)?;
    let verdict = runner(config, seed, turns)?.verify(&scenario, runs)?;
    let deterministic = verdict.deterministic;
    print!("{}", Output::Verify(verdict).to_json_line());

    if deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_default_config() -> Result<ExitCode, ScenarioError> {
    println!("{}", EngineConfig::default().to_ron_string()?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_scenario_template(preset: &str) -> Result<ExitCode, ScenarioError> {
    let scenario = match preset {
        "opening" => Scenario::opening(),
        "midgame" => Scenario::midgame(),
        other => {
            return Err(ScenarioError::Invalid(format!(
                "unknown preset '{other}' (expected opening or midgame)"
            )))
        }
    };
    println!("{}", scenario.to_ron_string()?);
    Ok(ExitCode::SUCCESS)
}
