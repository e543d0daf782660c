//! Configuration module for tier weight editing
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `TIERWEIGHT_*` environment variables (`__` separates nested keys, e.g.
//! `TIERWEIGHT_REBALANCE__SCALE=1000`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use tierweight_core::{RebalanceConfig, Rebalancer};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TIERWEIGHT";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] tierweight_core::ConfigError),
}

/// Staging behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Refuse to commit tiers that still hold zero-weight endpoints
    pub require_settled: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            require_settled: true,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rebalance: RebalanceConfig,
    pub staging: StagingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Config = settings.try_deserialize()?;
        loaded.rebalance.validate()?;
        tracing::debug!(
            scale = loaded.rebalance.scale.get(),
            require_settled = loaded.staging.require_settled,
            "configuration loaded"
        );
        Ok(loaded)
    }

    pub fn rebalancer(&self) -> Rebalancer {
        Rebalancer::with_config(self.rebalance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rebalance.scale.get(), 10_000);
        assert!(config.staging.require_settled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[rebalance]\nscale = 1000\n\n[staging]\nrequire_settled = false").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.rebalance.scale.get(), 1000);
        assert!(!config.staging.require_settled);
        assert_eq!(config.rebalancer().scale().get(), 1000);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[rebalance]\nscale = 0").unwrap();

        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/tierweight.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
