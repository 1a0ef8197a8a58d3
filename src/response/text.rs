//! Static text and HTML responses.

use std::fs;
use std::path::Path;

use axum::{
    body::{Body, Bytes},
    http::HeaderValue,
    response::Response,
};

use crate::error::ConfigError;
use crate::pipeline::draft::ResponseDraft;

#[derive(Debug, Clone)]
pub struct TextAsset {
    body: Bytes,
    content_type: HeaderValue,
}

impl TextAsset {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, body))
    }

    /// Content type follows the extension: `.html`/`.htm` is markup, anything else plain text.
    pub fn new(path: &Path, body: impl Into<Bytes>) -> Self {
        let is_html = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

        let content_type = if is_html {
            HeaderValue::from_static("text/html; charset=utf-8")
        } else {
            HeaderValue::from_static("text/plain; charset=utf-8")
        };

        Self {
            body: body.into(),
            content_type,
        }
    }

    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    pub fn respond(&self, mut draft: ResponseDraft) -> Response {
        draft.default_content_type(self.content_type.clone());
        draft.finish(Body::from(self.body.clone()))
    }
}
