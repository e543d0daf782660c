//! Detach command - Remove an endpoint and redistribute its share
//!
//! Usage:
//! ```bash
//! tierweight detach --input tier.json --target openai-west
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tierweight_router::Config;

use super::{print_weights, read_entries};

/// Arguments for the detach command
#[derive(Args)]
pub struct DetachArgs {
    /// Path to a JSON weights file
    #[arg(long, short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// Endpoint association id to remove
    #[arg(long, short = 't')]
    target: String,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Run the detach command
pub fn run(args: DetachArgs, config: &Config) -> Result<()> {
    let rebalancer = config.rebalancer();
    let current = rebalancer.from_raw(&read_entries(&args.input)?);

    let remaining = rebalancer
        .detach(&current, &args.target)
        .with_context(|| format!("Endpoint '{}' is not in {}", args.target, args.input.display()))?;

    print_weights(
        &format!("⚖ Detached '{}'", args.target),
        &remaining,
        &rebalancer,
        args.json,
    )
}
