use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use deltabc_core::accumulation::AccumulationMode;
use deltabc_core::config::{DeltaConfig, CONFIG_ENV_VAR};
use deltabc_core::pipelines::{run_coverage, run_reconcile, run_reformat, ReconcileOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about = "Delta water-quality reformatting and boundary condition series", long_about = None)]
struct Cli {
    /// Configuration file. Falls back to DELTABC_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append the wide survey export to the long lab and field datasets
    Reformat,
    /// Build the daily flow and nutrient series and update the accumulation files
    Reconcile(ReconcileArgs),
    /// List catalog stations with their first and last sample dates
    Coverage(CoverageArgs),
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Args, Debug, Default)]
struct ReconcileArgs {
    /// Only reconcile this target
    #[arg(long)]
    target: Option<String>,

    /// `append` or `upsert`; overrides the configured mode
    #[arg(long)]
    mode: Option<AccumulationMode>,

    /// Compute and report without writing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug, Default)]
struct CoverageArgs {
    /// Only stations sampled on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Command::Reformat => {
            let summary = run_reformat(&config)?;
            info!(lab_rows = summary.lab_rows, field_rows = summary.field_rows, "reformat finished");
            report::print_reformat(&summary, cli.json)
        }
        Command::Reconcile(args) => {
            let options = ReconcileOptions {
                target: args.target,
                mode: args.mode,
                dry_run: args.dry_run,
            };
            let summaries = run_reconcile(&config, &options)?;
            info!(targets = summaries.len(), dry_run = options.dry_run, "reconcile finished");
            report::print_reconcile(&summaries, cli.json)
        }
        Command::Coverage(args) => {
            let coverage = run_coverage(&config, args.since)?;
            report::print_coverage(&coverage, cli.json)
        }
        Command::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<DeltaConfig> {
    dotenvy::dotenv().ok();
    let path = explicit.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    match &path {
        Some(path) => info!(path = %path.display(), "loading configuration"),
        None => info!("no configuration file given; using defaults"),
    }
    DeltaConfig::load_or_default(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "built-in configuration is invalid".to_string(),
    })
}
