//! Connection pool configuration

use crate::types::HttpMethod;
use gallery_sim_config::SimulatorConfig;
use gallery_sim_resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved settings for the shared connection pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPoolConfig {
    /// Maximum idle connections kept for reuse
    pub capacity: usize,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Exponential backoff factor in seconds
    pub backoff_factor: f64,

    /// Status codes that trigger a retry
    pub retry_statuses: Vec<u16>,

    /// Verbs the pool may replay
    pub retry_methods: Vec<HttpMethod>,

    /// User agent string
    pub user_agent: String,

    /// How long an idle connection stays in the pool
    pub idle_timeout: Duration,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            max_retries: 3,
            backoff_factor: 0.3,
            retry_statuses: vec![429, 500, 502, 503, 504],
            retry_methods: HttpMethod::retry_eligible().to_vec(),
            user_agent: "GallerySim/1.0".to_string(),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ConnectionPoolConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_backoff_factor(self.max_retries, self.backoff_factor)
    }
}

impl From<&SimulatorConfig> for ConnectionPoolConfig {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            capacity: config.effective_pool_capacity(),
            max_retries: config.pool.max_retries,
            backoff_factor: config.pool.backoff_factor,
            retry_statuses: config.pool.retry_statuses.clone(),
            retry_methods: HttpMethod::retry_eligible().to_vec(),
            user_agent: config.target.user_agent.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_simulator_config() {
        let mut config = SimulatorConfig::default();
        config.workload.users = 12;
        config.pool.max_retries = 5;

        let pool = ConnectionPoolConfig::from(&config);
        assert_eq!(pool.capacity, 24);
        assert_eq!(pool.max_retries, 5);
        assert_eq!(pool.retry_policy().max_attempts, 6);
        assert_eq!(pool.user_agent, "GallerySim/1.0");
    }
}
