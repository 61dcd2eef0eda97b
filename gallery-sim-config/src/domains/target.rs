//! Gallery service endpoint configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the simulated users send their traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base address of the gallery service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for `POST /upload`
    #[serde(with = "humantime_serde", default = "default_upload_timeout")]
    pub upload_timeout: Duration,

    /// Timeout for gallery page fetches
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub page_timeout: Duration,

    /// Timeout for each image download
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub image_timeout: Duration,

    /// Timeout for `POST /admin/clear-repository`
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub clear_timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            upload_timeout: default_upload_timeout(),
            page_timeout: default_request_timeout(),
            image_timeout: default_request_timeout(),
            clear_timeout: default_request_timeout(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;

        for (timeout, name) in [
            (self.upload_timeout, "upload_timeout"),
            (self.page_timeout, "page_timeout"),
            (self.image_timeout, "image_timeout"),
            (self.clear_timeout, "clear_timeout"),
        ] {
            validate_positive(timeout.as_millis(), name, self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_base_url() -> String {
    "http://192.168.49.2".to_string()
}

fn default_user_agent() -> String {
    "GallerySim/1.0".to_string()
}

fn default_upload_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}
