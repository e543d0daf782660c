//! Rebalance command - Set one endpoint's share
//!
//! Usage:
//! ```bash
//! tierweight rebalance --input tier.json --target openai-east --unit 0.7
//! ```

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tierweight_router::Config;

use super::{print_weights, read_entries};

/// Arguments for the rebalance command
#[derive(Args)]
pub struct RebalanceArgs {
    /// Path to a JSON weights file
    #[arg(long, short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// Endpoint association id to adjust
    #[arg(long, short = 't')]
    target: String,

    /// Desired share in [0, 1]
    #[arg(long, short = 'u')]
    unit: f64,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Run the rebalance command
pub fn run(args: RebalanceArgs, config: &Config) -> Result<()> {
    let rebalancer = config.rebalancer();
    let current = rebalancer.from_raw(&read_entries(&args.input)?);

    let next = rebalancer.rebalance(&current, &args.target, args.unit);
    if next.is_empty() {
        bail!("Endpoint '{}' is not in {}", args.target, args.input.display());
    }

    print_weights(
        &format!("⚖ Rebalanced '{}' to {:.2}%", args.target, args.unit * 100.0),
        &next,
        &rebalancer,
        args.json,
    )
}
