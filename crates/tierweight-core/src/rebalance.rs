//! Rebalancer - keeps a tier's weights a budget-exact distribution
//!
//! Every operation here is pure: it takes the tier's current entries and
//! returns a complete new set whose fixed-point encoding sums to the scale.
//! Input order and ids are always preserved.

use tracing::debug;

use crate::config::RebalanceConfig;
use crate::fixed_point::{apportion, FixedPointScale, FixedWeight};
use crate::weight::{clamp_unit, RawWeightEntry, WeightEntry};

/// Weight rebalancer for a single tier's endpoint set
#[derive(Debug, Clone, Default)]
pub struct Rebalancer {
    config: RebalanceConfig,
}

impl Rebalancer {
    /// Create a rebalancer with the default 10,000 scale
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn builder() -> RebalancerBuilder {
        RebalancerBuilder::new()
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    pub fn scale(&self) -> FixedPointScale {
        self.config.scale
    }

    /// Rescale arbitrary non-negative weights into a distribution summing to 1.
    ///
    /// All-zero input becomes an even split.
    pub fn normalize<I: Clone>(&self, entries: &[WeightEntry<I>]) -> Vec<WeightEntry<I>> {
        let scale = self.scale();
        self.normalize_fixed(entries)
            .into_iter()
            .map(|w| WeightEntry::new(w.id, scale.decode(w.fixed)))
            .collect()
    }

    /// Same as [`normalize`](Self::normalize) but returns the fixed-point
    /// counts that go over the wire.
    pub fn normalize_fixed<I: Clone>(&self, entries: &[WeightEntry<I>]) -> Vec<FixedWeight<I>> {
        if entries.is_empty() {
            return Vec::new();
        }

        let clamped: Vec<f64> = entries.iter().map(|e| clamp_unit(e.unit)).collect();
        let sum: f64 = clamped.iter().sum();

        let shares: Vec<f64> = if sum <= 0.0 {
            debug!(
                entries = entries.len(),
                "all weights are zero, falling back to an even split"
            );
            vec![1.0 / entries.len() as f64; entries.len()]
        } else {
            clamped.iter().map(|unit| unit / sum).collect()
        };

        entries
            .iter()
            .zip(apportion(&shares, self.scale()))
            .map(|(entry, fixed)| FixedWeight::new(entry.id.clone(), fixed))
            .collect()
    }

    /// Set `target` to `desired` and redistribute the rest proportionally.
    ///
    /// Returns an empty list when `target` is not in `entries`. A lone entry
    /// is always pinned at 1.
    pub fn rebalance<I: Clone + PartialEq>(
        &self,
        entries: &[WeightEntry<I>],
        target: &I,
        desired: f64,
    ) -> Vec<WeightEntry<I>> {
        let Some(target_idx) = entries.iter().position(|e| &e.id == target) else {
            debug!(entries = entries.len(), "rebalance target not found in tier");
            return Vec::new();
        };

        if entries.len() == 1 {
            return vec![WeightEntry::new(entries[target_idx].id.clone(), 1.0)];
        }

        let desired = clamp_unit(desired);
        let remainder = clamp_unit(1.0 - desired);
        let others_count = entries.len() - 1;
        let others_total: f64 = entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, e)| clamp_unit(e.unit))
            .sum();

        let staged: Vec<WeightEntry<I>> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let unit = if i == target_idx {
                    desired
                } else if remainder <= 0.0 {
                    0.0
                } else if others_total <= 0.0 {
                    remainder / others_count as f64
                } else {
                    remainder * clamp_unit(entry.unit) / others_total
                };
                WeightEntry::new(entry.id.clone(), unit)
            })
            .collect();

        self.normalize(&staged)
    }

    /// Equal shares for `ids`, in input order.
    pub fn even_split<I: Clone>(&self, ids: &[I]) -> Vec<WeightEntry<I>> {
        if ids.is_empty() {
            return Vec::new();
        }
        let share = 1.0 / ids.len() as f64;
        let entries: Vec<WeightEntry<I>> = ids
            .iter()
            .map(|id| WeightEntry::new(id.clone(), share))
            .collect();
        self.normalize(&entries)
    }

    /// Remove `target` and hand its share to the remaining entries in
    /// proportion to their weights.
    ///
    /// Returns `None` when `target` is not in `entries`.
    pub fn detach<I: Clone + PartialEq>(
        &self,
        entries: &[WeightEntry<I>],
        target: &I,
    ) -> Option<Vec<WeightEntry<I>>> {
        let Some(target_idx) = entries.iter().position(|e| &e.id == target) else {
            debug!(entries = entries.len(), "detach target not found in tier");
            return None;
        };

        let remaining: Vec<WeightEntry<I>> = entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, e)| e.clone())
            .collect();

        Some(self.normalize(&remaining))
    }

    /// Convert raw (fraction, percent or untagged) weights and normalize them.
    pub fn from_raw<I: Clone>(&self, raw: &[RawWeightEntry<I>]) -> Vec<WeightEntry<I>> {
        let entries: Vec<WeightEntry<I>> = raw
            .iter()
            .map(|r| {
                WeightEntry::new(
                    r.id.clone(),
                    r.raw().to_unit(self.config.percent_epsilon),
                )
            })
            .collect();
        self.normalize(&entries)
    }

    /// Fixed-point view of already-normalized entries.
    pub fn to_fixed<I: Clone>(&self, entries: &[WeightEntry<I>]) -> Vec<FixedWeight<I>> {
        self.normalize_fixed(entries)
    }

    /// Continuous view of fixed-point weights.
    pub fn from_fixed<I: Clone>(&self, weights: &[FixedWeight<I>]) -> Vec<WeightEntry<I>> {
        let scale = self.scale();
        weights
            .iter()
            .map(|w| WeightEntry::new(w.id.clone(), scale.decode(w.fixed)))
            .collect()
    }
}

/// Builder for [`Rebalancer`]
#[derive(Debug, Default)]
pub struct RebalancerBuilder {
    config: RebalanceConfig,
}

impl RebalancerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(mut self, scale: FixedPointScale) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn percent_epsilon(mut self, epsilon: f64) -> Self {
        self.config.percent_epsilon = epsilon;
        self
    }

    pub fn build(self) -> Rebalancer {
        Rebalancer::with_config(self.config)
    }
}

/// [`Rebalancer::normalize`] at the default scale
pub fn normalize<I: Clone>(entries: &[WeightEntry<I>]) -> Vec<WeightEntry<I>> {
    Rebalancer::new().normalize(entries)
}

/// [`Rebalancer::rebalance`] at the default scale
pub fn rebalance<I: Clone + PartialEq>(
    entries: &[WeightEntry<I>],
    target: &I,
    desired: f64,
) -> Vec<WeightEntry<I>> {
    Rebalancer::new().rebalance(entries, target, desired)
}

/// [`Rebalancer::even_split`] at the default scale
pub fn even_split<I: Clone>(ids: &[I]) -> Vec<WeightEntry<I>> {
    Rebalancer::new().even_split(ids)
}
