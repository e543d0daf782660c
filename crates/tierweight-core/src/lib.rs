//! # Tierweight Core
//!
//! Budget-exact weight arithmetic for tiered endpoint routing:
//! - [`Rebalancer`]: normalize, rebalance, even split and detach over a
//!   tier's endpoint weights
//! - [`apportion`]: largest-remainder conversion to fixed-point counts
//! - [`RawWeight`]: fraction / percentage inputs from legacy sources
//!
//! ```rust
//! use tierweight_core::{rebalance, WeightEntry};
//!
//! let tier = vec![WeightEntry::new("a", 0.5), WeightEntry::new("b", 0.5)];
//! let next = rebalance(&tier, &"a", 0.7);
//! assert_eq!(next[1].unit, 0.3);
//! ```

pub mod config;
pub mod fixed_point;
pub mod rebalance;
pub mod weight;

pub use config::{ConfigError, RebalanceConfig};
pub use fixed_point::{apportion, FixedPointScale, FixedWeight, DEFAULT_SCALE};
pub use rebalance::{even_split, normalize, rebalance, Rebalancer, RebalancerBuilder};
pub use weight::{
    clamp_unit, infer_unit, RawWeight, RawWeightEntry, WeightEntry, WeightScale,
    DEFAULT_PERCENT_EPSILON,
};
