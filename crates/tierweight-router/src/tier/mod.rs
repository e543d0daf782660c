//! Tier - one failover rank and its weighted endpoints

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tierweight_core::{FixedPointScale, FixedWeight, RawWeightEntry, Rebalancer, WeightEntry};

use crate::store::StoreError;

/// Tier and staging errors
#[derive(Debug, Error)]
pub enum TierError {
    #[error("Unknown tier: {0}")]
    UnknownTier(String),
    #[error("Endpoint {0} is not attached to this tier")]
    UnknownEndpoint(String),
    #[error("Endpoint {0} is already attached to this tier")]
    DuplicateEndpoint(String),
    #[error("Tier has no staged changes")]
    NotDirty,
    #[error("A commit is already in flight for this tier")]
    CommitInFlight,
    #[error("Zero-weight endpoints must be removed before committing: {0:?}")]
    VacatedEndpoints(Vec<String>),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A tier's endpoint weights, keyed by endpoint-in-tier association id.
///
/// Entries are kept normalized: every mutation goes through the
/// [`Rebalancer`], so the fixed-point view always sums to the scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    id: String,
    entries: Vec<WeightEntry<String>>,
}

impl Tier {
    /// Create an empty tier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// Create a tier from unit weights, normalizing them
    pub fn from_entries(
        id: impl Into<String>,
        entries: &[WeightEntry<String>],
        rebalancer: &Rebalancer,
    ) -> Self {
        Self {
            id: id.into(),
            entries: rebalancer.normalize(entries),
        }
    }

    /// Create a tier from stored weights that may be percentages, fractions or
    /// inconsistent with each other. A lone endpoint always gets 100%.
    pub fn from_stored(
        id: impl Into<String>,
        stored: &[RawWeightEntry<String>],
        rebalancer: &Rebalancer,
    ) -> Self {
        let entries = if stored.len() == 1 {
            rebalancer.even_split(&[stored[0].id.clone()])
        } else {
            rebalancer.from_raw(stored)
        };
        Self {
            id: id.into(),
            entries,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entries(&self) -> &[WeightEntry<String>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn unit_of(&self, id: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.unit)
    }

    /// Attach an endpoint and split the tier evenly across all endpoints
    pub fn attach(&mut self, id: &str, rebalancer: &Rebalancer) -> Result<(), TierError> {
        if self.contains(id) {
            return Err(TierError::DuplicateEndpoint(id.to_string()));
        }

        let mut ids: Vec<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        ids.push(id.to_string());
        self.entries = rebalancer.even_split(&ids);
        Ok(())
    }

    /// Detach an endpoint and hand its share to the rest
    pub fn detach(&mut self, id: &str, rebalancer: &Rebalancer) -> Result<(), TierError> {
        let target = id.to_string();
        self.entries = rebalancer
            .detach(&self.entries, &target)
            .ok_or(TierError::UnknownEndpoint(target))?;
        Ok(())
    }

    /// Set one endpoint's share; the others keep their relative proportions
    pub fn set_weight(
        &mut self,
        id: &str,
        unit: f64,
        rebalancer: &Rebalancer,
    ) -> Result<(), TierError> {
        let target = id.to_string();
        let next = rebalancer.rebalance(&self.entries, &target, unit);
        if next.is_empty() {
            return Err(TierError::UnknownEndpoint(target));
        }
        self.entries = next;
        Ok(())
    }

    /// Endpoints driven to zero in a multi-endpoint tier
    pub fn vacated(&self) -> Vec<String> {
        if self.entries.len() < 2 {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.unit <= 0.0)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Whether the tier can be persisted as-is: a lone endpoint at exactly 1,
    /// otherwise a fixed-point sum equal to the scale with every endpoint at
    /// or above the minimum unit.
    pub fn is_settled(&self, scale: FixedPointScale) -> bool {
        match self.entries.len() {
            0 => true,
            1 => self.entries[0].unit == 1.0,
            _ => {
                let fixed: Vec<u32> = self.entries.iter().map(|e| scale.encode(e.unit)).collect();
                fixed.iter().sum::<u32>() == scale.get() && fixed.iter().all(|&f| f >= 1)
            }
        }
    }

    /// Wire view of the weights
    pub fn fixed_weights(&self, rebalancer: &Rebalancer) -> Vec<FixedWeight<String>> {
        rebalancer.to_fixed(&self.entries)
    }
}
