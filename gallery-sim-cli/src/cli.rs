//! CLI argument parsing definitions

use clap::Parser;
use gallery_sim_config::validation::non_negative_count;
use gallery_sim_config::{ConfigError, ConfigResult, SimulatorConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Simulate concurrent users uploading to and browsing an image gallery
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, allow_negative_numbers = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Print the final report as JSON instead of text
    #[arg(long)]
    pub json_report: bool,

    /// Folder containing test images
    #[arg(long, value_name = "PATH")]
    pub images_folder: Option<PathBuf>,

    /// Duration of each cycle in seconds
    #[arg(long, value_name = "SECONDS")]
    pub cycle_duration: Option<u64>,

    /// Maximum number of cycles to run (default: unlimited)
    #[arg(long, value_name = "N")]
    pub max_cycles: Option<u32>,

    /// Number of simulated users
    #[arg(long, value_name = "N")]
    pub num_users: Option<usize>,

    /// Connection pool size (default: max(10, 2 x users))
    #[arg(long, value_name = "N")]
    pub pool_size: Option<i64>,

    /// Maximum number of HTTP retries
    #[arg(long, value_name = "N")]
    pub max_retries: Option<i64>,

    /// Backoff factor for retries, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub backoff_factor: Option<f64>,

    /// Probability that an action is an upload
    #[arg(long, value_name = "P")]
    pub upload_probability: Option<f64>,

    /// Base URL of the gallery service
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Seed for reproducible action selection
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

impl Cli {
    /// Apply command-line flags on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut SimulatorConfig) -> ConfigResult<()> {
        if let Some(level) = &self.log_level {
            config.logging.level = level
                .parse()
                .map_err(|e: String| ConfigError::DomainError {
                    domain: "logging".to_string(),
                    message: e,
                })?;
        }

        let workload = &mut config.workload;
        if let Some(dir) = &self.images_folder {
            workload.images_dir = dir.clone();
        }
        if let Some(seconds) = self.cycle_duration {
            workload.cycle_duration = Duration::from_secs(seconds);
        }
        if let Some(max_cycles) = self.max_cycles {
            workload.max_cycles = Some(max_cycles);
        }
        if let Some(users) = self.num_users {
            workload.users = users;
        }
        if let Some(probability) = self.upload_probability {
            workload.upload_probability = probability;
        }
        if let Some(seed) = self.seed {
            workload.seed = Some(seed);
        }

        let pool = &mut config.pool;
        if let Some(size) = self.pool_size {
            if size < 1 {
                return Err(ConfigError::DomainError {
                    domain: "pool".to_string(),
                    message: format!("pool size must be at least 1, got {}", size),
                });
            }
            pool.capacity = Some(usize::try_from(size).map_err(|_| ConfigError::DomainError {
                domain: "pool".to_string(),
                message: format!("pool size is too large, got {}", size),
            })?);
        }
        if let Some(retries) = self.max_retries {
            pool.max_retries = non_negative_count(retries, "max_retries", "pool")?;
        }
        if let Some(factor) = self.backoff_factor {
            pool.backoff_factor = factor;
        }

        if let Some(base_url) = &self.base_url {
            config.target.base_url = base_url.clone();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["gallery-sim"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_overrides_apply() {
        let cli = parse(&[
            "--num-users", "5",
            "--cycle-duration", "300",
            "--max-cycles", "3",
            "--pool-size", "30",
            "--max-retries", "5",
            "--backoff-factor", "0.5",
            "--upload-probability", "0.4",
            "--seed", "9",
        ]);

        let mut config = SimulatorConfig::default();
        cli.apply_overrides(&mut config).unwrap();

        assert_eq!(config.workload.users, 5);
        assert_eq!(config.workload.cycle_duration, Duration::from_secs(300));
        assert_eq!(config.workload.max_cycles, Some(3));
        assert_eq!(config.workload.seed, Some(9));
        assert_eq!(config.pool.capacity, Some(30));
        assert_eq!(config.pool.max_retries, 5);
        assert_eq!(config.pool.backoff_factor, 0.5);
        assert_eq!(config.effective_pool_capacity(), 30);
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let mut config = SimulatorConfig::default();
        parse(&[]).apply_overrides(&mut config).unwrap();

        assert_eq!(config.workload.users, 1);
        assert_eq!(config.pool.max_retries, 3);
        assert_eq!(config.effective_pool_capacity(), 10);
    }

    #[test]
    fn test_negative_retries_rejected() {
        let cli = parse(&["--max-retries", "-1"]);
        let err = cli
            .apply_overrides(&mut SimulatorConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("cannot be negative"));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let cli = parse(&["--pool-size", "0"]);
        assert!(cli.apply_overrides(&mut SimulatorConfig::default()).is_err());
    }

    #[test]
    fn test_negative_backoff_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().to_str().unwrap();
        let cli = parse(&["--images-folder", folder, "--backoff-factor", "-0.1"]);

        let mut config = SimulatorConfig::default();
        cli.apply_overrides(&mut config).unwrap();
        assert!(config.validate_all().is_err());

        config.pool.backoff_factor = 0.1;
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_zero_users_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().to_str().unwrap();
        let cli = parse(&["--images-folder", folder, "--num-users", "0"]);

        let mut config = SimulatorConfig::default();
        cli.apply_overrides(&mut config).unwrap();
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let cli = parse(&["--log-level", "loud"]);
        assert!(cli.apply_overrides(&mut SimulatorConfig::default()).is_err());
    }
}
