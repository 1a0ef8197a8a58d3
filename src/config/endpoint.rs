//! Endpoint descriptor resolution.
//!
//! # Responsibilities
//! - Turn raw `EndpointConfig` entries into immutable `EndpointDescriptor`s
//! - Apply defaults (method GET, no-content response, no delay, status 200)
//! - Classify the response source once, so nothing is re-inspected per request
//!
//! # Design Decisions
//! - Missing `path` is a warning: the entry is skipped, startup continues
//! - Everything else malformed is a fatal `ConfigError`
//! - Source precedence: proxy > handler > response file > no-content

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use url::Url;

use crate::config::schema::{DelayConfig, EndpointConfig, MockConfig};
use crate::error::ConfigError;
use crate::simulation::delay::DelaySpec;

/// Methods an endpoint may be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn to_method(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported method `{}`", s))
    }
}

/// Where an endpoint's response comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Status and headers only.
    None,
    /// JSON template file.
    StaticJson(PathBuf),
    /// Text or HTML file.
    StaticText(PathBuf),
    /// Forward to an upstream.
    Proxy(Url),
    /// Named custom handler.
    CustomHandler(String),
}

impl ResponseSource {
    pub fn is_proxy(&self) -> bool {
        matches!(self, ResponseSource::Proxy(_))
    }
}

/// Fully resolved, immutable endpoint definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    pub path: String,
    pub method: HttpMethod,
    pub response: ResponseSource,
    pub delay: Option<DelaySpec>,
    pub rate_limit: Option<NonZeroU32>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub cors: bool,
    pub status: StatusCode,
}

impl EndpointDescriptor {
    /// Resolve one config entry. Returns `Ok(None)` when the entry has no path.
    pub fn from_config(
        entry: &EndpointConfig,
        responses_dir: &Path,
    ) -> Result<Option<Self>, ConfigError> {
        let path = match entry.path.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => {
                tracing::warn!(endpoint = ?entry, "No path detected, skipping endpoint");
                return Ok(None);
            }
        };

        let method_name = entry.method.as_deref().unwrap_or("GET");
        let method: HttpMethod = method_name
            .parse()
            .map_err(|reason: String| ConfigError::endpoint(method_name, &path, reason))?;

        if !path.starts_with('/') {
            return Err(ConfigError::endpoint(method.as_str(), &path, "path must start with `/`"));
        }

        let status = StatusCode::from_u16(entry.status.unwrap_or(200)).map_err(|_| {
            ConfigError::endpoint(
                method.as_str(),
                &path,
                format!("invalid status code {}", entry.status.unwrap_or_default()),
            )
        })?;

        let delay = resolve_delay(entry.delay)
            .map_err(|reason| ConfigError::endpoint(method.as_str(), &path, reason))?;

        let response = resolve_source(entry, responses_dir)
            .map_err(|reason| ConfigError::endpoint(method.as_str(), &path, reason))?;

        Ok(Some(Self {
            path,
            method,
            response,
            delay,
            rate_limit: entry.rate.and_then(NonZeroU32::new),
            headers: entry.headers.clone(),
            cookies: entry.cookies.clone(),
            cors: entry.cors,
            status,
        }))
    }
}

fn resolve_delay(delay: Option<DelayConfig>) -> Result<Option<DelaySpec>, String> {
    let spec = match delay {
        None => return Ok(None),
        Some(DelayConfig::Fixed(ms)) => DelaySpec::Fixed(whole_millis(ms)?),
        Some(DelayConfig::Range { min, max }) => {
            let (min, max) = (whole_millis(min)?, whole_millis(max)?);
            if min > max {
                return Err(format!("delay range min ({}ms) exceeds max ({}ms)", min.as_millis(), max.as_millis()));
            }
            DelaySpec::Range { min, max }
        }
    };
    let zero = match spec {
        DelaySpec::Fixed(d) => d.is_zero(),
        DelaySpec::Range { max, .. } => max.is_zero(),
    };
    Ok((!zero).then_some(spec))
}

fn whole_millis(ms: f64) -> Result<Duration, String> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(format!("invalid delay {}", ms));
    }
    Ok(Duration::from_millis(ms.round() as u64))
}

fn resolve_source(entry: &EndpointConfig, responses_dir: &Path) -> Result<ResponseSource, String> {
    if let Some(target) = entry.proxy.as_deref() {
        let url = Url::parse(target).map_err(|e| format!("invalid proxy target `{}`: {}", target, e))?;
        return Ok(ResponseSource::Proxy(url));
    }

    if let Some(handler) = entry.handler.as_deref() {
        return Ok(ResponseSource::CustomHandler(handler.to_string()));
    }

    let Some(file) = entry.response.as_deref() else {
        return Ok(ResponseSource::None);
    };

    let extension = Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let full_path = responses_dir.join(file);
    match extension.as_deref() {
        Some("json") => Ok(ResponseSource::StaticJson(full_path)),
        Some("txt") | Some("html") | Some("htm") => Ok(ResponseSource::StaticText(full_path)),
        Some("js") => Err(format!(
            "unsupported response file `{}`: script responses are not loaded, register a custom handler and reference it with `handler`",
            file
        )),
        _ => Err(format!(
            "unsupported response file `{}`: expected .json, .txt, .html or .htm (use `handler` for custom logic)",
            file
        )),
    }
}

/// Resolve every endpoint of a config, skipping entries without a path.
pub fn resolve_endpoints(config: &MockConfig) -> Result<Vec<EndpointDescriptor>, ConfigError> {
    let mut descriptors = Vec::with_capacity(config.endpoints.len());
    for entry in &config.endpoints {
        if let Some(descriptor) = EndpointDescriptor::from_config(entry, &config.responses_dir)? {
            descriptors.push(descriptor);
        }
    }
    Ok(descriptors)
}
