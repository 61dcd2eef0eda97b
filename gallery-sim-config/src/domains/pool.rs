//! Connection pool and retry configuration

use crate::error::ConfigResult;
use crate::validation::{validate_non_negative, Validatable};
use serde::{Deserialize, Serialize};

/// Shared connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum reusable connections; defaults to `max(10, 2 * users)`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,

    /// Additional attempts after the first one fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before retry `n` is `backoff_factor * 2^(n-1)` seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Status codes that trigger a retry
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

impl PoolConfig {
    /// Capacity to use for a run with the given number of users
    pub fn effective_capacity(&self, users: usize) -> usize {
        self.capacity.unwrap_or_else(|| usize::max(10, users.saturating_mul(2)))
    }
}

impl Validatable for PoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.capacity == Some(0) {
            return Err(self.validation_error("capacity must be at least 1"));
        }

        validate_non_negative(self.backoff_factor, "backoff_factor", self.domain_name())?;

        if let Some(code) = self
            .retry_statuses
            .iter()
            .find(|code| !(100..=599).contains(*code))
        {
            return Err(self.validation_error(format!("invalid retry status code {}", code)));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "pool"
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.3
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}
