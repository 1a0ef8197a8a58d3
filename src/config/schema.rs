//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mock server.
//! All types derive Serde traits for deserialization from TOML or JSON files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Directory holding the static response assets.
    pub responses_dir: PathBuf,

    /// Declared endpoints, in registration order.
    pub endpoints: Vec<EndpointConfig>,

    /// Rolling request-rate window.
    pub rate_buckets: RateBucketConfig,

    /// Initial values of the global simulation dials.
    pub simulation: SimulationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Operator control surface.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Top-level `serverHost` of the legacy JSON layout.
    #[serde(rename = "serverHost", skip_serializing)]
    pub server_host: Option<String>,

    /// Top-level `serverPort` of the legacy JSON layout.
    #[serde(rename = "serverPort", skip_serializing)]
    pub server_port: Option<u16>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            responses_dir: PathBuf::from("responses"),
            endpoints: Vec::new(),
            rate_buckets: RateBucketConfig::default(),
            simulation: SimulationConfig::default(),
            timeouts: TimeoutConfig::default(),
            admin: AdminConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
            server_host: None,
            server_port: None,
        }
    }
}

impl MockConfig {
    /// Fold legacy `serverHost` / `serverPort` into `listener.bind_address`.
    pub fn apply_legacy_listener(&mut self) {
        let host = self.server_host.take();
        let port = self.server_port.take();
        if host.is_some() || port.is_some() {
            tracing::debug!(host = ?host, port = ?port, "Using legacy listener keys");
        }
        self.listener.override_bind(host.as_deref(), port);
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the host and/or port part of the bind address.
    pub fn override_bind(&mut self, host: Option<&str>, port: Option<u16>) {
        if host.is_none() && port.is_none() {
            return;
        }
        let (current_host, current_port) = match self.bind_address.rsplit_once(':') {
            Some((h, p)) => (h.to_string(), p.to_string()),
            None => (self.bind_address.clone(), "3000".to_string()),
        };
        let host = host.map(str::to_string).unwrap_or(current_host);
        let port = port.map(|p| p.to_string()).unwrap_or(current_port);
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// One declared endpoint, as written in the config file.
///
/// Every field is optional on disk; resolution into an
/// [`EndpointDescriptor`](crate::config::endpoint::EndpointDescriptor) applies defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Route pattern, e.g. `/users/:id`.
    pub path: Option<String>,

    /// HTTP method (default GET).
    pub method: Option<String>,

    /// Static response asset file name, relative to `responses_dir`.
    pub response: Option<String>,

    /// Name of a registered custom handler.
    pub handler: Option<String>,

    /// Upstream URL to forward requests to.
    pub proxy: Option<String>,

    /// Artificial latency.
    pub delay: Option<DelayConfig>,

    /// Requests-per-second admission cap.
    pub rate: Option<u32>,

    /// Response headers.
    pub headers: BTreeMap<String, String>,

    /// Response cookies.
    pub cookies: BTreeMap<String, String>,

    /// Enable permissive CORS.
    pub cors: bool,

    /// Response status code (default 200).
    pub status: Option<u16>,
}

/// Delay as declared: either a number of milliseconds or a range.
///
/// Fractional values are accepted and rounded to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DelayConfig {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

/// Rolling request-rate window settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateBucketConfig {
    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Tick interval in milliseconds; `window_ms / interval_ms` slots.
    pub interval_ms: u64,
}

impl Default for RateBucketConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            interval_ms: 100,
        }
    }
}

/// Initial simulation dials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Multiplier applied to every configured delay.
    pub delay_factor: f64,

    /// Probability in [0, 1] that a request is answered with 503.
    pub fail_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            delay_factor: 1.0,
            fail_probability: 0.0,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a proxied upstream response in seconds.
    pub upstream_secs: u64,

    /// How long in-flight connections may drain after shutdown, in milliseconds.
    pub shutdown_grace_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            shutdown_grace_ms: 5000,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// Optional bearer token.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:3001".to_string(),
            api_key: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,

    /// Interval of the state/rate log report in seconds (0 disables).
    pub report_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            report_interval_secs: 5,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size accepted by the body-parsing stage, in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
