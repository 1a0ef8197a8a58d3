//! Error types shared across subsystems.
//!
//! # Design Decisions
//! - Configuration problems surface once, at startup, as `ConfigError`
//! - Request-time failures (simulated failure, rate limit, upstream error)
//!   are responses, never `Err` values escaping a handler
//! - `ServerError` is what `main` sees

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::validation::ValidationError;

/// Fatal configuration error detected while loading config or building pipelines.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("endpoint {method} {path}: {reason}")]
    Endpoint {
        method: String,
        path: String,
        reason: String,
    },

    #[error("response template {} does not render valid JSON: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn endpoint(method: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Endpoint {
            method: method.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error returned by the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connections did not drain within {0:?}")]
    ShutdownTimeout(Duration),
}
