//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ttl bounds)
//! - Check addresses parse and environment names are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system, including on reload

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;
use crate::publish::is_valid_environment;

/// A single problem with the service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ConfigValidationError { field, message });
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        );
    }

    if config.timeouts.request_secs == 0 {
        fail("timeouts.request_secs", "must be greater than 0".into());
    }

    let preview = &config.preview;
    if preview.max_ttl_secs == 0 {
        fail("preview.max_ttl_secs", "must be greater than 0".into());
    }
    if preview.default_ttl_secs == 0 || preview.default_ttl_secs > preview.max_ttl_secs {
        fail(
            "preview.default_ttl_secs",
            format!("must be within 1..={}", preview.max_ttl_secs),
        );
    }
    if preview.max_issue_attempts == 0 {
        fail("preview.max_issue_attempts", "must be greater than 0".into());
    }
    if preview.sweep_enabled && preview.sweep_interval_secs == 0 {
        fail("preview.sweep_interval_secs", "must be greater than 0".into());
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        fail(
            "observability.metrics_address",
            format!(
                "{:?} is not a socket address",
                config.observability.metrics_address
            ),
        );
    }

    if config.security.max_body_size == 0 {
        fail("security.max_body_size", "must be greater than 0".into());
    }

    for env in &config.environments.allowed {
        if !is_valid_environment(env) {
            fail("environments.allowed", format!("{:?} is not a valid environment name", env));
        }
    }

    if let Some(path) = &config.storage.snapshot_path {
        if path.trim().is_empty() {
            fail("storage.snapshot_path", "must not be empty when set".into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
