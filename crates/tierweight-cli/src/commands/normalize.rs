//! Normalize command - Clean up a tier's stored weights
//!
//! Usage:
//! ```bash
//! tierweight normalize --input tier.json
//! tierweight normalize --input tier.json --json
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tierweight_router::Config;

use super::{print_weights, read_entries};

/// Arguments for the normalize command
#[derive(Args)]
pub struct NormalizeArgs {
    /// Path to a JSON weights file
    #[arg(long, short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Run the normalize command
pub fn run(args: NormalizeArgs, config: &Config) -> Result<()> {
    let rebalancer = config.rebalancer();
    let raw = read_entries(&args.input)?;
    let entries = rebalancer.from_raw(&raw);

    tracing::info!(endpoints = entries.len(), "normalized weights");
    print_weights("⚖ Normalized Weights", &entries, &rebalancer, args.json)
}
