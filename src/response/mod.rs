//! Response producers.
//!
//! # Data Flow
//! ```text
//! ResponseSource (resolved at config time)
//!     → None          → no-content (drafted status + headers, empty body)
//!     → StaticJson    → template.rs (placeholder substitution)
//!     → StaticText    → text.rs (verbatim, content type by extension)
//!     → Proxy         → proxy.rs (upstream passthrough)
//!     → CustomHandler → handler.rs (registered handler)
//! ```
//!
//! # Design Decisions
//! - The producer is picked once per pipeline, never per request
//! - Every producer finishes the draft, so pre-set metadata always survives

pub mod handler;
pub mod proxy;
pub mod template;
pub mod text;

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::Response,
};

use crate::observability::SeriesKey;
use crate::pipeline::draft::ResponseDraft;

pub use handler::{CustomHandler, EchoHandler, HandlerRegistry, HandlerRequest};
pub use proxy::{upstream_client, ProxyTarget, UpstreamClient};
pub use template::JsonTemplate;
pub use text::TextAsset;

/// Terminal stage of a pipeline.
#[derive(Clone)]
pub enum Responder {
    NoContent,
    Json(JsonTemplate),
    Text(TextAsset),
    Proxy(ProxyTarget),
    Custom(Arc<dyn CustomHandler>),
}

impl Responder {
    pub fn kind(&self) -> &'static str {
        match self {
            Responder::NoContent => "no_content",
            Responder::Json(_) => "static_json",
            Responder::Text(_) => "static_text",
            Responder::Proxy(_) => "proxy",
            Responder::Custom(_) => "custom",
        }
    }

    pub async fn respond(
        &self,
        request: Request<Body>,
        draft: ResponseDraft,
        key: &SeriesKey,
        upstream: &UpstreamClient,
    ) -> Response {
        match self {
            Responder::NoContent => draft.finish(Body::empty()),
            Responder::Json(template) => template.respond(draft),
            Responder::Text(asset) => asset.respond(draft),
            Responder::Proxy(target) => target.forward(upstream, request, draft, key).await,
            Responder::Custom(handler) => handler.handle(HandlerRequest::from_request(request), draft).await,
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Responder::Json(template) => f.debug_tuple("Json").field(&template.path()).finish(),
            Responder::Proxy(target) => f.debug_tuple("Proxy").field(&target.authority()).finish(),
            other => f.write_str(other.kind()),
        }
    }
}
