//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, multiplier >= 1)
//! - Validate addresses the process will bind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProviderConfig → Result<(), Vec<ValidationError>>
//! - The endpoint scheme is not checked here; an unsupported scheme is a
//!   connection error and goes through the retry path
//! - The rule template is checked when the provider is built

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProviderConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ProviderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.provider.endpoint.trim().is_empty() {
        errors.push(ValidationError::new("provider.endpoint", "must not be empty"));
    }
    if config.provider.poll_interval_secs == 0 {
        errors.push(ValidationError::new("provider.poll_interval_secs", "must be greater than 0"));
    }
    if config.provider.request_timeout_secs == 0 {
        errors.push(ValidationError::new("provider.request_timeout_secs", "must be greater than 0"));
    }
    if config.provider.channel_capacity == 0 {
        errors.push(ValidationError::new("provider.channel_capacity", "must be greater than 0"));
    }

    let backoff = &config.backoff;
    if backoff.initial_interval_ms == 0 {
        errors.push(ValidationError::new("backoff.initial_interval_ms", "must be greater than 0"));
    }
    if !(backoff.multiplier.is_finite() && backoff.multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "backoff.multiplier",
            format!("must be a finite number >= 1.0, got {}", backoff.multiplier),
        ));
    }
    if backoff.max_interval_ms < backoff.initial_interval_ms {
        errors.push(ValidationError::new(
            "backoff.max_interval_ms",
            format!(
                "{} is below initial_interval_ms {}",
                backoff.max_interval_ms, backoff.initial_interval_ms
            ),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }
    if config.api.enabled && config.api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "api.bind_address",
            format!("invalid socket address {:?}", config.api.bind_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
