//! Main entry point for skill-curves
//!
//! Loads a results file, runs the singles-only and combined models for
//! every configured drift scenario and writes the comparison page.

use anyhow::Result;
use clap::Parser;
use skill_curves::config::{validate_config, AppConfig};
use skill_curves::pipeline::{input_path, output_path, Pipeline};
use std::path::PathBuf;
use tracing::{error, info};

/// Skill Curves - compare singles-only and singles+doubles ratings
#[derive(Parser)]
#[command(
    name = "skill-curves",
    version,
    about = "Compare singles-only and singles+doubles skill ratings over time",
    long_about = "Skill Curves rates every player in a tournament results file twice, once \
                 from singles matches only and once from singles and doubles together, using \
                 TrueSkill with skill drift over time, and writes the learning curves and \
                 rank changes as a self-contained HTML page or JSON dataset."
)]
struct Args {
    /// Results file (CSV)
    #[arg(short, long, value_name = "FILE", help = "Path to the tournament results CSV")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Output path (.json for the bare dataset, otherwise HTML)"
    )]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Number of players to export
    #[arg(long, value_name = "N", help = "Export only the top N players (0 = all)")]
    top_n: Option<usize>,

    /// Keep scenarios where one model failed
    #[arg(long, help = "Export partial results when one of the two models fails")]
    allow_partial: bool,

    /// Run both models of a scenario concurrently
    #[arg(long, help = "Run the two models of each scenario in parallel")]
    parallel: bool,

    /// Dry run mode (validate config, load data and exit)
    #[arg(
        long,
        help = "Validate configuration and input, then exit without running the models"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with run information
fn display_startup_banner(config: &AppConfig) {
    info!("📈 Skill Curves v{}", skill_curves::VERSION);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Prior: mu={} sigma={} beta={}",
        config.model.mu, config.model.sigma, config.model.beta
    );
    info!(
        "   Gammas: {:?} (reference {})",
        config.pipeline.gammas,
        config.pipeline.reference_gamma()
    );
    info!("   Time scale: {:?}", config.model.time_scale);
    info!("   Top N: {}", config.export.top_n);
    info!("   Allow partial: {}", config.pipeline.allow_partial);
    info!("   Parallel runs: {}", config.pipeline.parallel_runs);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(input) = &args.input {
        config.input.path = Some(input.to_string_lossy().into_owned());
    }

    if let Some(output) = &args.output {
        config.export.path = output.to_string_lossy().into_owned();
    }

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(top_n) = args.top_n {
        config.export.top_n = top_n;
    }

    if args.allow_partial {
        config.pipeline.allow_partial = true;
    }

    if args.parallel {
        config.pipeline.parallel_runs = true;
    }

    validate_config(&config)?;
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    init_logging(&config.service.log_level)?;
    display_startup_banner(&config);

    let input = input_path(&config)?;
    let pipeline = Pipeline::new(config);

    if args.dry_run {
        let summary = pipeline.summarize(&input)?;
        info!("Configuration validation successful");
        info!(
            "{} matches ({} singles, {} doubles), {} players",
            summary.matches, summary.singles, summary.doubles, summary.players
        );
        if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
            info!("Results span {} to {}", first, last);
        }
        info!("Dry run completed - exiting without running the models");
        return Ok(());
    }

    let output = output_path(pipeline.config())?;
    let report = pipeline.execute_async(&input, &output).await?;

    if report.is_partial() {
        info!("⚠️  Wrote partial results to {}", report.output.display());
    } else {
        info!("✅ Wrote {}", report.output.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
