//! Permissive CORS.
//!
//! Mirrors the defaults of the usual permissive CORS middleware: any origin,
//! the five mock methods plus HEAD, requested headers reflected, and a 204
//! answer to preflight requests.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::Response,
};

use crate::pipeline::draft::ResponseDraft;

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Result of applying the CORS policy to a request.
pub enum CorsOutcome {
    /// Headers were added to the draft; continue the pipeline.
    Continue,
    /// Preflight answered.
    Preflight(Response),
}

/// Permissive CORS policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsPolicy;

impl CorsPolicy {
    pub fn apply(&self, request: &Request<Body>, draft: &mut ResponseDraft) -> CorsOutcome {
        draft.insert_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        if request.method() != Method::OPTIONS {
            return CorsOutcome::Continue;
        }

        draft.insert_header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        if let Some(requested) = request.headers().get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            draft.insert_header(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            draft.append_header(header::VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
        }

        let mut preflight = draft.clone().finish_with(StatusCode::NO_CONTENT, Body::empty());
        preflight
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        CorsOutcome::Preflight(preflight)
    }
}
