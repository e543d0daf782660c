//! Weight store trait and error types
//!
//! The store is the remote owner of committed weights. Only committed plans
//! reach it; staged edits never do.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use tierweight_core::{FixedPointScale, RawWeightEntry, WeightScale};

use crate::staging::CommitPlan;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence seam for tier weights (Object Safe)
#[async_trait]
pub trait WeightStore: Send + Sync + Debug {
    /// Get the store name
    fn name(&self) -> &str;

    /// Apply a committed plan: upsert the listed weights, drop removed ids
    async fn put_weights(&self, plan: &CommitPlan) -> Result<(), StoreError>;

    /// Load a tier's stored weights in stored order
    async fn load_tier(&self, tier_id: &str) -> Result<Vec<RawWeightEntry<String>>, StoreError>;
}

/// In-memory weight store (for testing and the CLI)
#[derive(Debug, Default)]
pub struct MemoryWeightStore {
    scale: FixedPointScale,
    tiers: tokio::sync::RwLock<HashMap<String, Vec<RawWeightEntry<String>>>>,
}

impl MemoryWeightStore {
    pub fn new(scale: FixedPointScale) -> Self {
        Self {
            scale,
            tiers: Default::default(),
        }
    }

    /// Seed a tier with raw (possibly legacy) weights
    pub async fn seed(&self, tier_id: &str, entries: Vec<RawWeightEntry<String>>) {
        self.tiers.write().await.insert(tier_id.to_string(), entries);
    }

    /// Serialize every stored tier as a JSON snapshot
    pub async fn export_json(&self) -> Result<String, StoreError> {
        let tiers = self.tiers.read().await;
        let snapshot = StoreSnapshot {
            scale: self.scale,
            tiers: tiers
                .iter()
                .map(|(id, entries)| (id.clone(), entries.clone()))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Rebuild a store from a snapshot written by [`export_json`](Self::export_json)
    pub fn import_json(json: &str) -> Result<Self, StoreError> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)?;
        tracing::debug!(tiers = snapshot.tiers.len(), "imported weight store snapshot");
        Ok(Self {
            scale: snapshot.scale,
            tiers: tokio::sync::RwLock::new(snapshot.tiers.into_iter().collect()),
        })
    }
}

/// On-disk form of a [`MemoryWeightStore`]
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    scale: FixedPointScale,
    tiers: BTreeMap<String, Vec<RawWeightEntry<String>>>,
}

#[async_trait]
impl WeightStore for MemoryWeightStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put_weights(&self, plan: &CommitPlan) -> Result<(), StoreError> {
        let mut tiers = self.tiers.write().await;
        let stored = tiers.entry(plan.tier_id.clone()).or_default();

        stored.retain(|e| !plan.removed.contains(&e.id));
        for update in &plan.updates {
            let weight = self.scale.decode(update.fixed);
            match stored.iter_mut().find(|e| e.id == update.id) {
                Some(existing) => {
                    existing.weight = weight;
                    existing.scale = Some(WeightScale::Fraction);
                }
                None => stored.push(RawWeightEntry {
                    id: update.id.clone(),
                    weight,
                    scale: Some(WeightScale::Fraction),
                }),
            }
        }
        Ok(())
    }

    async fn load_tier(&self, tier_id: &str) -> Result<Vec<RawWeightEntry<String>>, StoreError> {
        self.tiers
            .read()
            .await
            .get(tier_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(tier_id.to_string()))
    }
}
