//! Domain-specific configuration modules

pub mod logging;
pub mod pool;
pub mod target;
pub mod workload;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main simulator configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Gallery service being exercised
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Simulated user population and cycle timing
    #[serde(default)]
    pub workload: workload::WorkloadConfig,

    /// Shared connection pool and retry policy
    #[serde(default)]
    pub pool: pool::PoolConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl SimulatorConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.workload.validate()?;
        self.pool.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Pool capacity after applying the user-count based default
    pub fn effective_pool_capacity(&self) -> usize {
        self.pool.effective_capacity(self.workload.users)
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = SimulatorConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
