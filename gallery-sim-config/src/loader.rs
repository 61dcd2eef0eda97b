//! Configuration loading and environment variable handling

use crate::domains::SimulatorConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::validation::non_negative_count;
use log::debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "GALLERY_SIM".to_string(),
        }
    }

    /// Load file and environment layers without validating, so callers can
    /// apply further overrides (command-line flags) before validation.
    pub fn load_unvalidated(
        &self,
        config_path: Option<impl AsRef<Path>>,
    ) -> ConfigResult<SimulatorConfig> {
        let mut config = match config_path {
            Some(path) => {
                debug!("Loading configuration from {:?}", path.as_ref());
                let content = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => SimulatorConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut SimulatorConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_workload_overrides(&mut config.workload)?;
        self.apply_pool_overrides(&mut config.pool)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("REQUEST_TIMEOUT")? {
            let timeout = Duration::from_secs(seconds);
            config.page_timeout = timeout;
            config.image_timeout = timeout;
            config.clear_timeout = timeout;
        }

        Ok(())
    }

    fn apply_workload_overrides(
        &self,
        config: &mut crate::domains::workload::WorkloadConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("IMAGES_DIR") {
            config.images_dir = PathBuf::from(dir);
        }

        if let Some(seconds) = self.parse_env_var::<u64>("CYCLE_DURATION")? {
            config.cycle_duration = Duration::from_secs(seconds);
        }

        if let Some(max_cycles) = self.parse_env_var::<u32>("MAX_CYCLES")? {
            config.max_cycles = Some(max_cycles);
        }

        if let Some(users) = self.parse_env_var::<usize>("USERS")? {
            config.users = users;
        }

        if let Some(probability) = self.parse_env_var::<f64>("UPLOAD_PROBABILITY")? {
            config.upload_probability = probability;
        }

        if let Some(seed) = self.parse_env_var::<u64>("SEED")? {
            config.seed = Some(seed);
        }

        Ok(())
    }

    fn apply_pool_overrides(
        &self,
        config: &mut crate::domains::pool::PoolConfig,
    ) -> ConfigResult<()> {
        if let Some(capacity) = self.parse_env_var::<usize>("POOL_SIZE")? {
            config.capacity = Some(capacity);
        }

        if let Some(retries) = self.parse_env_var::<i64>("MAX_RETRIES")? {
            config.max_retries = non_negative_count(retries, "max_retries", "pool")?;
        }

        if let Some(factor) = self.parse_env_var::<f64>("BACKOFF_FACTOR")? {
            config.backoff_factor = factor;
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.level = level
                .parse()
                .map_err(|e: String| ConfigError::EnvError(e))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = format
                .parse()
                .map_err(|e: String| ConfigError::EnvError(e))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => {
                debug!("Applying {}_{} override", self.prefix, name);
                raw.trim().parse::<T>().map(Some).map_err(|e| {
                    ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))
                })
            }
            Err(_) => Ok(None),
        }
    }
}
