//! Per-endpoint request pipelines.
//!
//! # Data Flow
//! ```text
//! EndpointDescriptor (startup)
//!     → builder.rs (fixed stage order, terminal producer resolved once)
//!     → Pipeline (immutable, shared by every request on the route)
//!
//! Request
//!     → observe → cors? → rate_limit? → delay? → parse_body? (not for proxy)
//!     → metadata → fail_simulation → respond
//! ```
//!
//! # Design Decisions
//! - Stage order is fixed; a stage is only present when its descriptor
//!   field asks for it
//! - Any stage may short-circuit, and the terminal stage always answers
//! - Shared state (tracker, simulation dials, upstream client) is injected
//!   through `PipelineDeps`

pub mod builder;
pub mod draft;
pub mod stage;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};

use crate::observability::{RateTracker, SeriesKey};
use crate::response::UpstreamClient;
use crate::security::CorsPolicy;
use crate::simulation::SimulationState;

pub use builder::{build_pipeline, build_routes, BuildContext};
pub use draft::{ResponseDraft, ResponseMetadata};
pub use stage::{Exchange, Flow, Stage};

/// Shared handles every pipeline reads.
#[derive(Clone)]
pub struct PipelineDeps {
    pub tracker: Arc<RateTracker>,
    pub simulation: Arc<SimulationState>,
    pub upstream: UpstreamClient,
}

/// Ordered stages of one (route pattern, method).
#[derive(Debug)]
pub struct Pipeline {
    key: SeriesKey,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(key: SeriesKey, stages: Vec<Stage>) -> Self {
        Self { key, stages }
    }

    /// Answers `OPTIONS` preflight requests on a CORS-enabled path.
    pub fn preflight(path: impl Into<String>) -> Self {
        Self::new(SeriesKey::new(path, "OPTIONS"), vec![Stage::Cors(CorsPolicy)])
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub async fn run(&self, deps: &PipelineDeps, request: Request<Body>) -> Response {
        let mut exchange = Exchange::new(request);
        for stage in &self.stages {
            match stage.apply(&self.key, deps, exchange).await {
                Flow::Next(next) => exchange = next,
                Flow::Done(response) => return response,
            }
        }

        tracing::error!(method = %self.key.method, route = %self.key.path, "Pipeline produced no response");
        exchange
            .draft
            .finish_with(StatusCode::INTERNAL_SERVER_ERROR, Body::from("No response produced"))
    }
}
