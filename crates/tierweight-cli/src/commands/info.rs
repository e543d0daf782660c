//! Info command - Show version and effective configuration
//!
//! Usage:
//! ```bash
//! tierweight info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tierweight_router::{config::ENV_PREFIX, Config};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs, config: &Config) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let scale = config.rebalance.scale;

    println!("{}", "Tierweight - Tier Endpoint Weights".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Configuration:".bold());
    println!(
        "  {} {} ({} = 100%)",
        "Fixed-point scale:".dimmed(),
        scale.to_string().green(),
        scale
    );
    println!(
        "  {} {}",
        "Minimum share:".dimmed(),
        format!("{}", scale.min_unit()).green()
    );
    println!(
        "  {} {}",
        "Percent epsilon:".dimmed(),
        format!("{:e}", config.rebalance.percent_epsilon).green()
    );
    println!(
        "  {} {}",
        "Require settled commits:".dimmed(),
        config.staging.require_settled.to_string().green()
    );
    println!();

    println!("{}", "Environment:".bold());
    println!(
        "  {} Override settings with {}_<SECTION>__<KEY>, e.g. {}",
        "ℹ".blue(),
        ENV_PREFIX,
        format!("{}_REBALANCE__SCALE=1000", ENV_PREFIX).green()
    );
    println!();

    Ok(())
}
