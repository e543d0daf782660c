//! Weighted endpoint selection within a tier

use rand::Rng;
use tierweight_core::Rebalancer;

use crate::tier::Tier;

/// Picks endpoints with probability equal to their fixed-point weight
#[derive(Debug, Clone)]
pub struct WeightedPicker {
    ids: Vec<String>,
    /// Cumulative upper bounds, exclusive
    bounds: Vec<u32>,
}

impl WeightedPicker {
    pub fn from_tier(tier: &Tier, rebalancer: &Rebalancer) -> Self {
        let mut ids = Vec::with_capacity(tier.len());
        let mut bounds = Vec::with_capacity(tier.len());
        let mut running = 0u32;

        for weight in tier.fixed_weights(rebalancer) {
            running += weight.fixed;
            ids.push(weight.id);
            bounds.push(running);
        }

        Self { ids, bounds }
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Sum of all weights (the scale, for a non-empty tier)
    pub fn total(&self) -> u32 {
        self.bounds.last().copied().unwrap_or(0)
    }

    /// Endpoint owning `point`; zero-weight endpoints own no points.
    pub fn pick_at(&self, point: u32) -> Option<&str> {
        if point >= self.total() {
            return None;
        }
        let idx = self.bounds.partition_point(|&bound| bound <= point);
        self.ids.get(idx).map(String::as_str)
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        self.pick_at(rng.random_range(0..self.total()))
    }
}
