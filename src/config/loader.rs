//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::MockConfig;
use crate::config::validation::validate_config;
use crate::error::ConfigError;

/// Load and validate configuration from a TOML or JSON file.
///
/// A relative `responses_dir` is resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<MockConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse_config(&content, is_json(path))?;

    if config.responses_dir.is_relative() {
        if let Some(parent) = path.parent() {
            config.responses_dir = parent.join(&config.responses_dir);
        }
    }

    tracing::debug!(
        path = %path.display(),
        endpoints = config.endpoints.len(),
        "Configuration file parsed"
    );

    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str, json: bool) -> Result<MockConfig, ConfigError> {
    let mut config: MockConfig = if json {
        serde_json::from_str(content)?
    } else {
        toml::from_str(content)?
    };
    config.apply_legacy_listener();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
