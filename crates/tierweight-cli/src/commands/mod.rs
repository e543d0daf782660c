//! Subcommands and shared input/output helpers

pub mod detach;
pub mod info;
pub mod normalize;
pub mod rebalance;
pub mod simulate;
pub mod split;

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use std::path::Path;
use tierweight_core::{RawWeightEntry, Rebalancer, WeightEntry};

/// Read a JSON array of `{ "id", "weight", "scale"? }` records
pub fn read_entries(path: &Path) -> Result<Vec<RawWeightEntry<String>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read weights file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse weights JSON: {}", path.display()))
}

/// One row of command output
#[derive(Debug, Serialize)]
pub struct WeightRow {
    pub id: String,
    pub unit: f64,
    pub fixed: u32,
}

/// Machine-readable command output
#[derive(Debug, Serialize)]
pub struct WeightReport {
    pub scale: u32,
    pub weights: Vec<WeightRow>,
}

impl WeightReport {
    pub fn new(entries: &[WeightEntry<String>], rebalancer: &Rebalancer) -> Self {
        let weights = rebalancer
            .to_fixed(entries)
            .into_iter()
            .zip(entries)
            .map(|(fixed, entry)| WeightRow {
                id: fixed.id,
                unit: entry.unit,
                fixed: fixed.fixed,
            })
            .collect();

        Self {
            scale: rebalancer.scale().get(),
            weights,
        }
    }

    pub fn total(&self) -> u32 {
        self.weights.iter().map(|w| w.fixed).sum()
    }
}

/// Print weights as a table or JSON
pub fn print_weights(
    title: &str,
    entries: &[WeightEntry<String>],
    rebalancer: &Rebalancer,
    json: bool,
) -> Result<()> {
    let report = WeightReport::new(entries, rebalancer);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", title.bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Endpoint").fg(Color::Cyan),
            Cell::new("Share").fg(Color::Cyan),
            Cell::new(format!("Fixed (/{})", report.scale)).fg(Color::Cyan),
        ]);

    for row in &report.weights {
        let fixed = Cell::new(row.fixed);
        table.add_row(vec![
            Cell::new(&row.id).fg(Color::Green),
            Cell::new(format!("{:.2}%", row.unit * 100.0)),
            if row.fixed == 0 { fixed.fg(Color::Red) } else { fixed },
        ]);
    }

    println!("{table}");
    println!(
        "{} {} / {}",
        "Total:".dimmed(),
        report.total(),
        report.scale
    );

    let vacated: Vec<&str> = report
        .weights
        .iter()
        .filter(|w| w.fixed == 0)
        .map(|w| w.id.as_str())
        .collect();
    if report.weights.len() > 1 && !vacated.is_empty() {
        crate::print_warning(&format!(
            "Zero-weight endpoints should be detached: {}",
            vacated.join(", ")
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "a", "weight": 60}}, {{"id": "b", "weight": 0.4, "scale": "fraction"}}]"#
        )
        .unwrap();

        let entries = read_entries(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[0].scale, None);
    }

    #[test]
    fn test_read_entries_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = read_entries(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse weights JSON"));
    }

    #[test]
    fn test_report_totals() {
        let rb = Rebalancer::new();
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let report = WeightReport::new(&rb.even_split(&ids), &rb);

        assert_eq!(report.scale, 10_000);
        assert_eq!(report.total(), 10_000);
        assert_eq!(report.weights[0].fixed, 3334);
    }
}
