//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a finite, non-negative float
pub fn validate_non_negative(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be negative, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a probability in `[0, 1]`
pub fn validate_probability(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be between 0 and 1, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} scheme '{}' not supported (only http/https)", field_name, scheme),
        }),
    }
}

/// Validate that a directory exists
pub fn validate_existing_dir(path: &Path, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !path.is_dir() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} '{}' does not exist", field_name, path.display()),
        });
    }
    Ok(())
}

/// Convert a signed count coming from the environment or command line,
/// rejecting negative values.
pub fn non_negative_count(value: i64, field_name: &str, domain: &str) -> ConfigResult<u32> {
    u32::try_from(value).map_err(|_| ConfigError::DomainError {
        domain: domain.to_string(),
        message: if value < 0 {
            format!("{} cannot be negative, got {}", field_name, value)
        } else {
            format!("{} is too large, got {}", field_name, value)
        },
    })
}
