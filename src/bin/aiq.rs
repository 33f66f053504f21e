//! Command-line estimator of an agent's Algorithmic IQ.
//!
//! # Usage
//!
//! ```bash
//! # Stratified estimate of a Q(lambda) agent, discount 0.99
//! aiq --samples refmachines/Sequence.samples -r Sequence,2 -a Q_l,0,0.9,0.5,0.05 -d 0.99
//!
//! # Undiscounted, 100 step episodes, 2000 samples, pair log in ./log
//! aiq --samples refmachines/Sequence.samples -a Random -l 100 -s 2000 --log log
//!
//! # Simple Monte Carlo cross-check, JSON on stdout
//! aiq --samples refmachines/Sequence.samples -a Random -l 100 --simple-mc --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use aiq::constants::{DEFAULT_REPORTING_START_STAGE, DEFAULT_SEED, DEFAULT_WORKER_TIMEOUT_SECS};
use aiq::output::{format_report, format_simple_mc, to_json_pretty};
use aiq::pair_log::default_file_name;
use aiq::{
    load_samples, AgentSpec, AiqError, EngineConfig, EnvironmentSpec, Progress,
    SimpleMcEstimator, StratifiedEstimator,
};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Estimate an agent's Algorithmic IQ over sampled reference-machine programs
#[derive(Parser, Debug)]
#[command(name = "aiq")]
#[command(version)]
struct Args {
    /// Environment and parameters, e.g. "Sequence,2" or "Constant,0.5"
    #[arg(short = 'r', long, default_value = "Sequence")]
    environment: String,

    /// Agent and parameters, e.g. "Random", "Fixed,1" or "Q_l,0,0.9,0.5,0.05"
    #[arg(short, long, default_value = "Random")]
    agent: String,

    /// Discount rate in (0, 1]
    #[arg(short, long, default_value_t = 1.0)]
    discount: f64,

    /// Episode length; derived from the discount rate when omitted
    #[arg(short = 'l', long)]
    episode_length: Option<usize>,

    /// Total number of samples (defaults to the number of programs)
    #[arg(short, long)]
    sample_size: Option<usize>,

    /// Worker threads (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Program sample file, one "<stratum> <program>" per line
    #[arg(long)]
    samples: PathBuf,

    /// Directory for the pair log
    #[arg(long)]
    log: Option<PathBuf>,

    /// Use the simple Monte Carlo estimator instead of the stratified one
    #[arg(long)]
    simple_mc: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// First stage whose estimate is reported
    #[arg(long, default_value_t = DEFAULT_REPORTING_START_STAGE)]
    reporting_start_stage: usize,

    /// Seed for agent and sign randomness
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Seconds to wait for any outstanding trial before giving up
    #[arg(long, default_value_t = DEFAULT_WORKER_TIMEOUT_SECS)]
    timeout: u64,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "aiq=debug" } else { "aiq=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, AiqError> {
    let environment = EnvironmentSpec::parse(&args.environment)?;
    let agent = AgentSpec::parse(&args.agent)?;

    let mut config = EngineConfig {
        episode_length: args.episode_length,
        discount_rate: args.discount,
        sample_size: args.sample_size,
        reporting_start_stage: args.reporting_start_stage,
        seed: args.seed,
        threads: args.threads,
        worker_timeout: Duration::from_secs(args.timeout.max(1)),
        pair_log: None,
    };
    config.validate()?;
    if let Some(dir) = &args.log {
        let name = default_file_name(
            &environment.to_string(),
            config.discount_rate,
            config.resolve_episode_length()?,
            &agent.to_string(),
        );
        config.pair_log = Some(dir.join(name));
    }

    let samples = load_samples(&args.samples)?;
    let bar = progress_bar(args.json);

    let output = if args.simple_mc {
        let report = SimpleMcEstimator::new(environment, agent, config)?
            .on_progress(progress_updater(bar.clone()))
            .run(&samples)?;
        bar.finish_and_clear();
        if args.json {
            to_json(&report)?
        } else {
            format_simple_mc(&report)
        }
    } else {
        let report = StratifiedEstimator::new(environment, agent, config)?
            .on_progress(progress_updater(bar.clone()))
            .run(&samples)?;
        bar.finish_and_clear();
        if args.json {
            to_json(&report)?
        } else {
            format_report(&report)
        }
    };
    Ok(output)
}

fn to_json<T: serde::Serialize>(report: &T) -> Result<String, AiqError> {
    Ok(to_json_pretty(report)?)
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn progress_updater(bar: ProgressBar) -> impl Fn(&Progress) + Send + Sync + 'static {
    move |progress: &Progress| {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.completed as u64);
        bar.set_message(format!("stage {}/{}", progress.stage, progress.stages));
    }
}
