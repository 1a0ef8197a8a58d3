//! Pipeline and route table construction.
//!
//! # Responsibilities
//! - Build one pipeline per descriptor in the fixed stage order
//! - Resolve the terminal producer (load assets, find handlers, parse proxy targets)
//! - Assemble the route table, register tracker series, add CORS preflight routes
//!
//! # Design Decisions
//! - Every problem surfaces here as a `ConfigError`, never at request time
//! - Duplicate (path, method) declarations: the first one wins

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;

use crate::config::{EndpointDescriptor, ResponseSource};
use crate::error::ConfigError;
use crate::observability::{RateTracker, SeriesKey};
use crate::pipeline::draft::ResponseMetadata;
use crate::pipeline::stage::Stage;
use crate::pipeline::Pipeline;
use crate::response::{HandlerRegistry, JsonTemplate, ProxyTarget, Responder, TextAsset};
use crate::routing::{PathPattern, RouteTable};
use crate::security::{CorsPolicy, FixedWindowLimiter};

/// Everything besides the descriptor needed to build a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub handlers: &'a HandlerRegistry,
    pub max_body_size: usize,
    pub upstream_timeout: Duration,
}

pub fn build_pipeline(descriptor: &EndpointDescriptor, ctx: &BuildContext<'_>) -> Result<Pipeline, ConfigError> {
    let responder = build_responder(descriptor, ctx)?;
    let metadata = ResponseMetadata::from_descriptor(descriptor)?;

    let mut stages = vec![Stage::Observe];
    if descriptor.cors {
        stages.push(Stage::Cors(CorsPolicy));
    }
    if let Some(limit) = descriptor.rate_limit {
        stages.push(Stage::RateLimit(FixedWindowLimiter::new(limit)));
    }
    if let Some(delay) = descriptor.delay {
        stages.push(Stage::Delay(delay));
    }
    if !descriptor.response.is_proxy() {
        stages.push(Stage::ParseBody {
            limit: ctx.max_body_size,
        });
    }
    stages.push(Stage::Metadata(metadata));
    stages.push(Stage::FailSimulation);
    stages.push(Stage::Respond(responder));

    let key = SeriesKey::new(&descriptor.path, descriptor.method.as_str());
    Ok(Pipeline::new(key, stages))
}

fn build_responder(descriptor: &EndpointDescriptor, ctx: &BuildContext<'_>) -> Result<Responder, ConfigError> {
    let invalid = |reason: String| ConfigError::endpoint(descriptor.method.as_str(), &descriptor.path, reason);

    let responder = match &descriptor.response {
        ResponseSource::None => Responder::NoContent,
        ResponseSource::StaticJson(path) => Responder::Json(JsonTemplate::load(path)?),
        ResponseSource::StaticText(path) => Responder::Text(TextAsset::load(path)?),
        ResponseSource::Proxy(url) => Responder::Proxy(ProxyTarget::new(url, ctx.upstream_timeout).map_err(invalid)?),
        ResponseSource::CustomHandler(name) => {
            let handler = ctx
                .handlers
                .get(name)
                .ok_or_else(|| invalid(format!("unknown handler `{}`", name)))?;
            if !handler.supports(descriptor.method) {
                return Err(invalid(format!("handler `{}` does not support {}", name, descriptor.method)));
            }
            Responder::Custom(handler)
        }
    };
    Ok(responder)
}

/// Build the route table for all descriptors, in declaration order.
pub fn build_routes(
    descriptors: &[EndpointDescriptor],
    ctx: &BuildContext<'_>,
    tracker: &RateTracker,
) -> Result<RouteTable, ConfigError> {
    let mut table = RouteTable::new();
    let mut cors_paths: Vec<&str> = Vec::new();

    for descriptor in descriptors {
        let method = descriptor.method.to_method();
        if table.contains(&descriptor.path, &method) {
            tracing::warn!(
                method = %descriptor.method,
                path = %descriptor.path,
                "Duplicate endpoint, keeping the first declaration"
            );
            continue;
        }

        let pattern = PathPattern::parse(&descriptor.path)
            .map_err(|reason| ConfigError::endpoint(descriptor.method.as_str(), &descriptor.path, reason))?;
        let pipeline = build_pipeline(descriptor, ctx)?;

        tracker.register(pipeline.key().clone());
        tracing::info!(
            method = %descriptor.method,
            path = %descriptor.path,
            stages = ?pipeline.stage_names(),
            "Registered endpoint"
        );
        table.push(pattern, method, Arc::new(pipeline));

        if descriptor.cors && !cors_paths.contains(&descriptor.path.as_str()) {
            cors_paths.push(&descriptor.path);
        }
    }

    for path in cors_paths {
        let pattern = PathPattern::parse(path).map_err(|reason| ConfigError::endpoint("OPTIONS", path, reason))?;
        table.push(pattern, Method::OPTIONS, Arc::new(Pipeline::preflight(path)));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpMethod;
    use crate::simulation::DelaySpec;
    use axum::http::StatusCode;
    use std::collections::BTreeMap;
    use std::num::NonZeroU32;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/responses")
            .join(name)
    }

    fn descriptor(path: &str, method: HttpMethod, response: ResponseSource) -> EndpointDescriptor {
        EndpointDescriptor {
            path: path.to_string(),
            method,
            response,
            delay: None,
            rate_limit: None,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            cors: false,
            status: StatusCode::OK,
        }
    }

    fn build(d: &EndpointDescriptor) -> Result<Pipeline, ConfigError> {
        let handlers = HandlerRegistry::with_builtins();
        let ctx = BuildContext {
            handlers: &handlers,
            max_body_size: 1024,
            upstream_timeout: Duration::from_secs(1),
        };
        build_pipeline(d, &ctx)
    }

    #[test]
    fn minimal_pipeline() {
        let pipeline = build(&descriptor("/ping", HttpMethod::Get, ResponseSource::None)).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["observe", "parse_body", "metadata", "fail_simulation", "respond"]
        );
        assert_eq!(pipeline.key(), &SeriesKey::new("/ping", "GET"));
    }

    #[test]
    fn full_pipeline_keeps_fixed_order() {
        let mut d = descriptor("/users", HttpMethod::Post, ResponseSource::StaticJson(fixture("user.json")));
        d.cors = true;
        d.rate_limit = NonZeroU32::new(5);
        d.delay = Some(DelaySpec::Fixed(Duration::from_millis(10)));

        let pipeline = build(&d).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["observe", "cors", "rate_limit", "delay", "parse_body", "metadata", "fail_simulation", "respond"]
        );
    }

    #[test]
    fn proxy_pipeline_skips_body_parsing() {
        let url = url::Url::parse("http://127.0.0.1:9/").unwrap();
        let pipeline = build(&descriptor("/api/{*rest}", HttpMethod::Get, ResponseSource::Proxy(url))).unwrap();
        assert!(!pipeline.stage_names().contains(&"parse_body"));
    }

    #[test]
    fn bad_sources_fail_the_build() {
        let missing = descriptor("/m", HttpMethod::Get, ResponseSource::StaticJson(fixture("missing.json")));
        assert!(matches!(build(&missing), Err(ConfigError::Io { .. })));

        let unknown = descriptor("/h", HttpMethod::Get, ResponseSource::CustomHandler("nope".into()));
        assert!(matches!(build(&unknown), Err(ConfigError::Endpoint { .. })));

        let https = url::Url::parse("https://example.com").unwrap();
        let tls = descriptor("/p", HttpMethod::Get, ResponseSource::Proxy(https));
        assert!(matches!(build(&tls), Err(ConfigError::Endpoint { .. })));
    }

    #[test]
    fn route_table_dedups_and_adds_preflight() {
        let mut cors = descriptor("/items", HttpMethod::Get, ResponseSource::None);
        cors.cors = true;
        let mut cors_post = descriptor("/items", HttpMethod::Post, ResponseSource::None);
        cors_post.cors = true;
        let mut duplicate = descriptor("/items", HttpMethod::Get, ResponseSource::None);
        duplicate.status = StatusCode::IM_A_TEAPOT;

        let handlers = HandlerRegistry::with_builtins();
        let ctx = BuildContext {
            handlers: &handlers,
            max_body_size: 1024,
            upstream_timeout: Duration::from_secs(1),
        };
        let tracker = RateTracker::new(Duration::from_secs(1), Duration::from_millis(100));
        let table = build_routes(&[cors, cors_post, duplicate], &ctx, &tracker).unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.contains("/items", &Method::OPTIONS));
        assert_eq!(tracker.count(&SeriesKey::new("/items", "GET")), Some(0));
        assert_eq!(tracker.count(&SeriesKey::new("/items", "POST")), Some(0));

        let preflight = table.lookup(&Method::OPTIONS, "/items").unwrap();
        assert_eq!(preflight.pipeline.stage_names(), vec!["cors"]);
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let d = descriptor("/a/*/b", HttpMethod::Get, ResponseSource::None);
        let handlers = HandlerRegistry::new();
        let ctx = BuildContext {
            handlers: &handlers,
            max_body_size: 1024,
            upstream_timeout: Duration::from_secs(1),
        };
        let tracker = RateTracker::new(Duration::from_secs(1), Duration::from_millis(100));
        assert!(build_routes(&[d], &ctx, &tracker).is_err());
    }
}
