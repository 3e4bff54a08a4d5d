//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and probe budget >= 1)
//! - Detect duplicate breaker names
//! - Check bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BreakerConfig, GuardConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("breaker name must not be empty")]
    EmptyName,

    #[error("breaker `{0}`: failure_threshold must be at least 1")]
    ZeroFailureThreshold(String),

    #[error("breaker `{0}`: half_open_max_attempts must be at least 1")]
    ZeroHalfOpenAttempts(String),

    #[error("duplicate breaker name `{0}`")]
    DuplicateName(String),

    #[error("{field}: `{value}` is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a single breaker's settings.
pub fn validate_breaker(config: &BreakerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_breaker(config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the whole configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_breaker(&config.defaults, &mut errors);

    let mut seen = HashSet::new();
    for breaker in &config.breakers {
        check_breaker(breaker, &mut errors);
        if !breaker.name.is_empty() && !seen.insert(breaker.name.as_str()) {
            errors.push(ValidationError::DuplicateName(breaker.name.clone()));
        }
    }

    if config.admin.enabled {
        check_address("admin.bind_address", &config.admin.bind_address, &mut errors);
    }
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_breaker(config: &BreakerConfig, errors: &mut Vec<ValidationError>) {
    if config.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if config.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold(config.name.clone()));
    }
    if config.half_open_max_attempts == 0 {
        errors.push(ValidationError::ZeroHalfOpenAttempts(config.name.clone()));
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GuardConfig::default();
        config.breakers.push(
            BreakerConfig::named("users")
                .with_failure_threshold(0)
                .with_half_open_max_attempts(0),
        );
        config.breakers.push(BreakerConfig::named("users"));
        config.breakers.push(BreakerConfig::named(" "));
        config.admin.bind_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroFailureThreshold("users".into())));
        assert!(errors.contains(&ValidationError::ZeroHalfOpenAttempts("users".into())));
        assert!(errors.contains(&ValidationError::DuplicateName("users".into())));
        assert!(errors.contains(&ValidationError::EmptyName));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidAddress { field: "admin.bind_address", .. }
        )));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_disabled_listeners_skip_address_checks() {
        let mut config = GuardConfig::default();
        config.admin.enabled = false;
        config.admin.bind_address = "nope".into();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_reset_timeout_is_allowed() {
        let config = BreakerConfig::named("fast").with_reset_timeout(std::time::Duration::ZERO);
        assert!(validate_breaker(&config).is_ok());
    }
}
