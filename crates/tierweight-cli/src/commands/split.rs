//! Split command - Even weights for a fresh tier
//!
//! Usage:
//! ```bash
//! tierweight split openai-east openai-west anthropic
//! ```

use anyhow::Result;
use clap::Args;
use tierweight_router::Config;

use super::print_weights;

/// Arguments for the split command
#[derive(Args)]
pub struct SplitArgs {
    /// Endpoint association ids, in tier order
    #[arg(required = true)]
    ids: Vec<String>,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Run the split command
pub fn run(args: SplitArgs, config: &Config) -> Result<()> {
    let rebalancer = config.rebalancer();
    let entries = rebalancer.even_split(&args.ids);
    print_weights("⚖ Even Split", &entries, &rebalancer, args.json)
}
