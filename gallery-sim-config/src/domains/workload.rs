//! Simulated user population and cycle timing

use crate::error::ConfigResult;
use crate::validation::{
    validate_existing_dir, validate_positive, validate_probability, Validatable,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Workload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Directory scanned once for uploadable images
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Length of one cycle
    #[serde(with = "humantime_serde", default = "default_cycle_duration")]
    pub cycle_duration: Duration,

    /// Number of cycles to run; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u32>,

    /// Number of concurrent simulated users
    #[serde(default = "default_users")]
    pub users: usize,

    /// Probability that an action is an upload rather than a browse
    #[serde(default = "default_upload_probability")]
    pub upload_probability: f64,

    /// Pause between two actions of the same user
    #[serde(with = "humantime_serde", default = "default_action_interval")]
    pub action_interval: Duration,

    /// Pause between the cleanup of one cycle and the start of the next
    #[serde(with = "humantime_serde", default = "default_inter_cycle_pause")]
    pub inter_cycle_pause: Duration,

    /// Seed for reproducible action and page selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            cycle_duration: default_cycle_duration(),
            max_cycles: None,
            users: default_users(),
            upload_probability: default_upload_probability(),
            action_interval: default_action_interval(),
            inter_cycle_pause: default_inter_cycle_pause(),
            seed: None,
        }
    }
}

impl Validatable for WorkloadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_existing_dir(&self.images_dir, "images_dir", self.domain_name())?;

        if self.users < 1 {
            return Err(self.validation_error("users must be at least 1"));
        }

        validate_positive(
            self.cycle_duration.as_millis(),
            "cycle_duration",
            self.domain_name(),
        )?;

        if let Some(max_cycles) = self.max_cycles {
            validate_positive(max_cycles, "max_cycles", self.domain_name())?;
        }

        validate_probability(
            self.upload_probability,
            "upload_probability",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "workload"
    }
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("./test-images")
}

fn default_cycle_duration() -> Duration {
    Duration::from_secs(10)
}

fn default_users() -> usize {
    1
}

fn default_upload_probability() -> f64 {
    0.25
}

fn default_action_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_inter_cycle_pause() -> Duration {
    Duration::from_secs(12)
}
