//! Domain-driven configuration for the gallery load simulator
//!
//! Configuration is split by functional domain (target service, workload,
//! connection pool, logging), loaded from YAML and overridden from the
//! environment, then validated before any simulated user starts.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    logging::LoggingConfig, pool::PoolConfig, target::TargetConfig, workload::WorkloadConfig,
    SimulatorConfig,
};
