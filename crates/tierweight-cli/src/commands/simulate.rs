//! Simulate command - Sample weighted picks
//!
//! Usage:
//! ```bash
//! tierweight simulate --input tier.json --requests 10000 --seed 7
//! ```

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::path::PathBuf;
use tierweight_router::{Config, Tier, WeightedPicker};

use super::read_entries;

/// Arguments for the simulate command
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a JSON weights file
    #[arg(long, short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// Number of requests to route
    #[arg(long, short = 'n', default_value_t = 10_000)]
    requests: u32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Run the simulate command
pub fn run(args: SimulateArgs, config: &Config) -> Result<()> {
    let rebalancer = config.rebalancer();
    let tier = Tier::from_stored("simulated", &read_entries(&args.input)?, &rebalancer);
    let picker = WeightedPicker::from_tier(&tier, &rebalancer);

    if picker.is_empty() {
        bail!("No endpoints in {}", args.input.display());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for _ in 0..args.requests {
        if let Some(id) = picker.pick(&mut rng) {
            *counts.entry(id).or_default() += 1;
        }
    }

    println!(
        "{} {} requests",
        "🎲 Simulated".bold().cyan(),
        args.requests
    );
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Endpoint").fg(Color::Cyan),
            Cell::new("Weight").fg(Color::Cyan),
            Cell::new("Observed").fg(Color::Cyan),
            Cell::new("Requests").fg(Color::Cyan),
        ]);

    for entry in tier.entries() {
        let hits = counts.get(entry.id.as_str()).copied().unwrap_or(0);
        let observed = if args.requests == 0 {
            0.0
        } else {
            f64::from(hits) / f64::from(args.requests)
        };
        table.add_row(vec![
            Cell::new(&entry.id).fg(Color::Green),
            Cell::new(format!("{:.2}%", entry.unit * 100.0)),
            Cell::new(format!("{:.2}%", observed * 100.0)).fg(Color::Yellow),
            Cell::new(hits),
        ]);
    }

    println!("{table}");
    Ok(())
}
