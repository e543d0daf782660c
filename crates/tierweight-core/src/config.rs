//! Rebalancer configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fixed_point::FixedPointScale;
use crate::weight::DEFAULT_PERCENT_EPSILON;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("fixed-point scale must be non-zero")]
    ZeroScale,
    #[error("percent epsilon must be finite and non-negative, got {0}")]
    InvalidEpsilon(f64),
}

/// Settings shared by every rebalancing operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Fixed-point denominator (10,000 = four decimal digits)
    pub scale: FixedPointScale,
    /// Tolerance above 1 before an untagged weight is read as a percentage
    pub percent_epsilon: f64,
}

impl RebalanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.percent_epsilon.is_finite() || self.percent_epsilon < 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.percent_epsilon));
        }
        Ok(())
    }
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            scale: FixedPointScale::default(),
            percent_epsilon: DEFAULT_PERCENT_EPSILON,
        }
    }
}
