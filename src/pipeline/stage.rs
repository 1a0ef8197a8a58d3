//! Pipeline stages.
//!
//! A stage takes the request and the response draft, and either hands both
//! on (`Flow::Next`) or finishes the exchange (`Flow::Done`). Every
//! short-circuit finishes the draft, keeping what earlier stages wrote.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};

use crate::http::body::parse_body;
use crate::observability::{metrics, SeriesKey};
use crate::pipeline::draft::{ResponseDraft, ResponseMetadata};
use crate::pipeline::PipelineDeps;
use crate::response::Responder;
use crate::security::{CorsOutcome, CorsPolicy, FixedWindowLimiter};
use crate::simulation::{compute_delay, should_fail, DelaySpec};

/// A request travelling through a pipeline.
#[derive(Debug)]
pub struct Exchange {
    pub request: Request<Body>,
    pub draft: ResponseDraft,
}

impl Exchange {
    pub fn new(request: Request<Body>) -> Self {
        Self {
            request,
            draft: ResponseDraft::default(),
        }
    }
}

pub enum Flow {
    Next(Exchange),
    Done(Response),
}

#[derive(Debug)]
pub enum Stage {
    /// Count the request in the rolling rate tracker.
    Observe,
    Cors(CorsPolicy),
    RateLimit(FixedWindowLimiter),
    Delay(DelaySpec),
    ParseBody { limit: usize },
    Metadata(ResponseMetadata),
    FailSimulation,
    Respond(Responder),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Observe => "observe",
            Stage::Cors(_) => "cors",
            Stage::RateLimit(_) => "rate_limit",
            Stage::Delay(_) => "delay",
            Stage::ParseBody { .. } => "parse_body",
            Stage::Metadata(_) => "metadata",
            Stage::FailSimulation => "fail_simulation",
            Stage::Respond(_) => "respond",
        }
    }

    pub async fn apply(&self, key: &SeriesKey, deps: &PipelineDeps, exchange: Exchange) -> Flow {
        let Exchange { request, mut draft } = exchange;

        match self {
            Stage::Observe => {
                deps.tracker.observe(key);
            }
            Stage::Cors(policy) => {
                if let CorsOutcome::Preflight(response) = policy.apply(&request, &mut draft) {
                    return Flow::Done(response);
                }
            }
            Stage::RateLimit(limiter) => {
                if let Err(retry_after) = limiter.try_acquire() {
                    tracing::debug!(
                        method = %key.method,
                        route = %key.path,
                        limit = limiter.limit(),
                        "Rate limit exceeded"
                    );
                    metrics::record_rate_limited(&key.path);
                    return Flow::Done(limiter.reject(draft, retry_after));
                }
            }
            Stage::Delay(spec) => {
                let delay = compute_delay(spec, deps.simulation.delay_factor());
                if delay > Duration::ZERO {
                    tokio::time::sleep(delay).await;
                }
            }
            Stage::ParseBody { limit } => match parse_body(request, *limit).await {
                Ok(request) => return Flow::Next(Exchange { request, draft }),
                Err(e) => {
                    tracing::debug!(method = %key.method, route = %key.path, error = %e, "Rejected request body");
                    return Flow::Done(e.into_response(draft));
                }
            },
            Stage::Metadata(metadata) => metadata.apply(&mut draft),
            Stage::FailSimulation => {
                if should_fail(deps.simulation.fail_probability()) {
                    tracing::debug!(method = %key.method, route = %key.path, "Simulated failure");
                    metrics::record_simulated_failure(&key.path);
                    return Flow::Done(draft.finish_with(StatusCode::SERVICE_UNAVAILABLE, Body::empty()));
                }
            }
            Stage::Respond(responder) => {
                return Flow::Done(responder.respond(request, draft, key, &deps.upstream).await);
            }
        }

        Flow::Next(Exchange { request, draft })
    }
}
