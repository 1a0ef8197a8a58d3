//! Static JSON responses with placeholder substitution.
//!
//! # Placeholders
//! - `${uuidRandom}`: a fresh UUID v4 for every occurrence
//! - `${timestampUtc}`: the request time, RFC 3339 with milliseconds
//!
//! # Design Decisions
//! - The file is read once when the pipeline is built
//! - A trial render must parse as JSON, otherwise the route fails to build
//! - Substituted values never contain JSON syntax, so a template that
//!   validated once renders valid JSON on every request

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::pipeline::draft::ResponseDraft;

pub const UUID_PLACEHOLDER: &str = "${uuidRandom}";
pub const TIMESTAMP_PLACEHOLDER: &str = "${timestampUtc}";

#[derive(Debug, Clone)]
pub struct JsonTemplate {
    path: PathBuf,
    source: String,
}

impl JsonTemplate {
    /// Read and validate a template file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, source)
    }

    pub fn from_source(path: &Path, source: String) -> Result<Self, ConfigError> {
        let template = Self {
            path: path.to_path_buf(),
            source,
        };
        serde_json::from_str::<serde_json::Value>(&template.render()).map_err(|source| {
            ConfigError::Template {
                path: template.path.clone(),
                source,
            }
        })?;
        Ok(template)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Substitute every placeholder.
    pub fn render(&self) -> String {
        let timestamp = humantime::format_rfc3339_millis(SystemTime::now()).to_string();

        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(pos) = rest.find("${") {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(UUID_PLACEHOLDER) {
                out.push_str(&Uuid::new_v4().to_string());
                rest = after;
            } else if let Some(after) = tail.strip_prefix(TIMESTAMP_PLACEHOLDER) {
                out.push_str(&timestamp);
                rest = after;
            } else {
                out.push_str("${");
                rest = &tail[2..];
            }
        }
        out.push_str(rest);
        out
    }

    pub fn respond(&self, mut draft: ResponseDraft) -> Response {
        draft.default_content_type(HeaderValue::from_static("application/json"));
        draft.finish(Body::from(self.render()))
    }
}
