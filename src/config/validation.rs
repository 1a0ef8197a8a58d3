//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of global settings (serde handles syntactic)
//! - Validate value ranges (window/interval, simulation dials, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MockConfig → Result<(), Vec<ValidationError>>
//! - Per-endpoint checks happen during descriptor resolution, where the
//!   offending route can be named

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::MockConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("invalid admin bind address `{0}`")]
    InvalidAdminAddress(String),

    #[error("rate bucket window ({window_ms}ms) must be a positive multiple of the interval ({interval_ms}ms)")]
    InvalidRateWindow { window_ms: u64, interval_ms: u64 },

    #[error("delay factor must be >= 0, got {0}")]
    NegativeDelayFactor(f64),

    #[error("fail probability must be within [0, 1], got {0}")]
    FailProbabilityOutOfRange(f64),

    #[error("max body size must be > 0")]
    ZeroBodyLimit,
}

/// Validate global settings, collecting every problem.
pub fn validate_config(config: &MockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAdminAddress(
            config.admin.bind_address.clone(),
        ));
    }

    let buckets = &config.rate_buckets;
    if buckets.interval_ms == 0
        || buckets.window_ms < buckets.interval_ms
        || buckets.window_ms % buckets.interval_ms != 0
    {
        errors.push(ValidationError::InvalidRateWindow {
            window_ms: buckets.window_ms,
            interval_ms: buckets.interval_ms,
        });
    }

    let sim = &config.simulation;
    if !(sim.delay_factor >= 0.0) {
        errors.push(ValidationError::NegativeDelayFactor(sim.delay_factor));
    }
    if !(0.0..=1.0).contains(&sim.fail_probability) {
        errors.push(ValidationError::FailProbabilityOutOfRange(sim.fail_probability));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
