//! Tierweight Router - tiered endpoint weights for LLM routing
//!
//! Builds on `tierweight-core` to manage the weighted endpoints of each
//! failover tier: attaching and detaching endpoints, staging slider edits,
//! committing budget-exact fixed-point weights to a store, and picking
//! endpoints in proportion to their weights.
//!
//! ## Quick Start
//!
//! ```rust
//! use tierweight_router::{Config, MemoryWeightStore, Tier, TierBoard};
//!
//! # tokio_test::block_on(async {
//! let board = TierBoard::new(&Config::default());
//! let mut tier = Tier::new("primary");
//! tier.attach("openai-east", board.rebalancer()).unwrap();
//! tier.attach("openai-west", board.rebalancer()).unwrap();
//! board.insert(tier).unwrap();
//!
//! board.stage_weight("primary", "openai-east", 0.75).unwrap();
//! let plan = board.commit("primary", &MemoryWeightStore::default()).await.unwrap();
//! assert_eq!(plan.updates.len(), 2);
//! # });
//! ```

// Public modules
pub mod config;
pub mod picker;
pub mod staging;
pub mod store;
pub mod tier;

// Re-export key types for easy use
pub use crate::config::{Config, ConfigError, StagingConfig};
pub use picker::WeightedPicker;
pub use staging::{CommitPlan, TierBoard, TierEditState, TierSession};
pub use store::{MemoryWeightStore, StoreError, WeightStore};
pub use tier::{Tier, TierError};

pub use tierweight_core::{FixedPointScale, FixedWeight, RawWeightEntry, Rebalancer, WeightEntry};
