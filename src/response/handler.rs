//! Named custom handlers.
//!
//! Endpoints may name a handler instead of a response file. Handlers are
//! registered in a [`HandlerRegistry`] before the server is built; an unknown
//! name, or a handler that does not support the endpoint's method, fails the
//! build.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request},
    response::Response,
};
use futures_util::future::BoxFuture;

use crate::config::HttpMethod;
use crate::http::body::ParsedBody;
use crate::pipeline::draft::ResponseDraft;
use crate::routing::PathParams;

/// What a custom handler sees of the request.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    pub path: String,
    pub params: PathParams,
    pub query: BTreeMap<String, String>,
    pub headers: HeaderMap,
    pub body: ParsedBody,
}

impl HandlerRequest {
    pub fn from_request(request: Request<Body>) -> Self {
        let (mut parts, _body) = request.into_parts();
        let query = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            path: parts.uri.path().to_string(),
            params: parts.extensions.remove::<PathParams>().unwrap_or_default(),
            body: parts.extensions.remove::<ParsedBody>().unwrap_or_default(),
            query,
            method: parts.method,
            headers: parts.headers,
        }
    }
}

/// A response producer supplied by code rather than by a file.
pub trait CustomHandler: Send + Sync {
    /// Methods this handler can serve.
    fn methods(&self) -> &[HttpMethod];

    fn supports(&self, method: HttpMethod) -> bool {
        self.methods().contains(&method)
    }

    /// Produce the response. `draft` already carries the endpoint's status,
    /// headers and cookies.
    fn handle(&self, request: HandlerRequest, draft: ResponseDraft) -> BoxFuture<'static, Response>;
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn CustomHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers shipped with the server.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("echo", EchoHandler);
        registry
    }

    /// Register a handler, replacing any previous one of the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl CustomHandler + 'static) -> &mut Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CustomHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").field("handlers", &self.names()).finish()
    }
}

/// Reflects the request back as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl CustomHandler for EchoHandler {
    fn methods(&self) -> &[HttpMethod] {
        &HttpMethod::ALL
    }

    fn handle(&self, request: HandlerRequest, mut draft: ResponseDraft) -> BoxFuture<'static, Response> {
        let headers: BTreeMap<&str, &str> = request
            .headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
            .collect();

        let echoed = serde_json::json!({
            "method": request.method.as_str(),
            "path": request.path,
            "params": request.params.as_map(),
            "query": request.query,
            "headers": headers,
            "body": request.body.to_json(),
        });

        draft.default_content_type(HeaderValue::from_static("application/json"));
        let response = draft.finish(Body::from(echoed.to_string()));
        Box::pin(async move { response })
    }
}
