//! Tierweight CLI - inspect and rebalance tier endpoint weights
//!
//! # Usage
//!
//! ```bash
//! # Clean up legacy weights (percentages, inconsistent sums)
//! tierweight normalize --input tier.json
//!
//! # Set one endpoint's share and redistribute the rest
//! tierweight rebalance --input tier.json --target openai-east --unit 0.7
//!
//! # Even split for a fresh tier
//! tierweight split openai-east openai-west anthropic
//!
//! # Sample routing decisions against the weights
//! tierweight simulate --input tier.json --requests 10000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tierweight_router::Config;

mod commands;

use commands::{detach, info, normalize, rebalance, simulate, split};

/// Tierweight - budget-exact weights for tiered LLM routing
#[derive(Parser)]
#[command(
    name = "tierweight",
    version,
    about = "Tierweight CLI - Tier Endpoint Weight Tooling",
    long_about = "Tierweight normalizes and rebalances the endpoint weights of a routing tier.\n\n\
                  Weights are encoded as fixed-point counts that always sum\n\
                  exactly to the configured scale."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long, short = 'c', value_name = "FILE", global = true, env = "TIERWEIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize weights so they sum to exactly 100%
    #[command(name = "normalize")]
    Normalize(normalize::NormalizeArgs),

    /// Set one endpoint's weight and redistribute the others
    #[command(name = "rebalance")]
    Rebalance(rebalance::RebalanceArgs),

    /// Split a tier evenly across endpoints
    #[command(name = "split")]
    Split(split::SplitArgs),

    /// Remove an endpoint and redistribute its share
    #[command(name = "detach")]
    Detach(detach::DetachArgs),

    /// Sample weighted picks and compare against the weights
    #[command(name = "simulate")]
    Simulate(simulate::SimulateArgs),

    /// Show version and effective configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Execute command
    match cli.command {
        Commands::Normalize(args) => normalize::run(args, &config),
        Commands::Rebalance(args) => rebalance::run(args, &config),
        Commands::Split(args) => split::run(args, &config),
        Commands::Detach(args) => detach::run(args, &config),
        Commands::Simulate(args) => simulate::run(args, &config),
        Commands::Info(args) => info::run(args, &config),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}
