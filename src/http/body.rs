//! Request body parsing.
//!
//! # Responsibilities
//! - Buffer the body up to the configured limit
//! - Decode JSON and urlencoded forms; keep anything else raw
//! - Attach the result to the request for custom handlers
//!
//! # Design Decisions
//! - Skipped for proxy routes so the body streams through untouched
//! - The buffered bytes are put back as the request body

use std::collections::BTreeMap;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    response::Response,
};
use futures_util::StreamExt;
use thiserror::Error;

use crate::pipeline::draft::ResponseDraft;

/// Body as seen by custom handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParsedBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(BTreeMap<String, String>),
    Raw(Bytes),
}

impl ParsedBody {
    /// JSON view of the body; raw bodies become lossy UTF-8 text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParsedBody::Empty => serde_json::Value::Null,
            ParsedBody::Json(value) => value.clone(),
            ParsedBody::Form(form) => serde_json::json!(form),
            ParsedBody::Raw(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),

    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

impl BodyError {
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::Read(_) | BodyError::MalformedJson(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Error response that keeps whatever the draft already holds.
    pub fn into_response(self, draft: ResponseDraft) -> Response {
        let status = self.status();
        draft.finish_with(status, Body::from(self.to_string()))
    }
}

/// Buffer and decode the body, returning the rebuilt request.
pub async fn parse_body(request: Request<Body>, limit: usize) -> Result<Request<Body>, BodyError> {
    let (mut parts, body) = request.into_parts();

    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > limit) {
        return Err(BodyError::TooLarge(limit));
    }

    let mut buf = Vec::new();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge(limit));
        }
        buf.extend_from_slice(&chunk);
    }

    let bytes = Bytes::from(buf);
    let parsed = decode(&parts.headers, &bytes)?;

    parts.extensions.insert(parsed);
    Ok(Request::from_parts(parts, Body::from(bytes)))
}

fn decode(headers: &HeaderMap, bytes: &Bytes) -> Result<ParsedBody, BodyError> {
    if bytes.is_empty() {
        return Ok(ParsedBody::Empty);
    }

    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/json" || mime.ends_with("+json") {
        return Ok(ParsedBody::Json(serde_json::from_slice(bytes)?));
    }

    if mime == "application/x-www-form-urlencoded" {
        let form = url::form_urlencoded::parse(bytes).into_owned().collect();
        return Ok(ParsedBody::Form(form));
    }

    Ok(ParsedBody::Raw(bytes.clone()))
}
