//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the route table and pipelines from configuration
//! - Create the Axum router with request-id and tracing middleware
//! - Dispatch every request to the pipeline of its matching route
//! - Run background tasks (rate ticker, state reporter, admin API)
//! - Serve with graceful shutdown bounded by a drain deadline

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{resolve_endpoints, validate_config, MockConfig};
use crate::error::{ConfigError, ServerError};
use crate::lifecycle::Shutdown;
use crate::observability::logging::StateReporter;
use crate::observability::{metrics, RateTracker};
use crate::pipeline::{build_routes, BuildContext, PipelineDeps};
use crate::response::{upstream_client, HandlerRegistry};
use crate::routing::RouteTable;
use crate::simulation::SimulationState;

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub deps: PipelineDeps,
}

/// The mock server: route table, shared dials and the Axum router.
pub struct MockServer {
    config: MockConfig,
    router: Router,
    routes: Arc<RouteTable>,
    simulation: Arc<SimulationState>,
    tracker: Arc<RateTracker>,
}

impl MockServer {
    /// Validate the config and build every pipeline.
    pub fn new(config: MockConfig, handlers: HandlerRegistry) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let descriptors = resolve_endpoints(&config)?;
        let tracker = Arc::new(RateTracker::new(
            Duration::from_millis(config.rate_buckets.window_ms),
            Duration::from_millis(config.rate_buckets.interval_ms),
        ));
        let simulation = Arc::new(SimulationState::new(
            config.simulation.delay_factor,
            config.simulation.fail_probability,
        ));

        let ctx = BuildContext {
            handlers: &handlers,
            max_body_size: config.security.max_body_size,
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        };
        let routes = Arc::new(build_routes(&descriptors, &ctx, &tracker)?);

        tracing::info!(
            endpoints = descriptors.len(),
            routes = routes.len(),
            "Route table built"
        );

        let state = AppState {
            routes: routes.clone(),
            deps: PipelineDeps {
                tracker: tracker.clone(),
                simulation: simulation.clone(),
                upstream: upstream_client(),
            },
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
            routes,
            simulation,
            tracker,
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn simulation(&self) -> Arc<SimulationState> {
        self.simulation.clone()
    }

    pub fn tracker(&self) -> Arc<RateTracker> {
        self.tracker.clone()
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Router of the operator API, sharing this server's dials.
    pub fn admin_router(&self, shutdown: Shutdown) -> Router {
        setup_admin_router(AdminState {
            simulation: self.simulation.clone(),
            tracker: self.tracker.clone(),
            shutdown,
            api_key: self.config.admin.api_key.as_deref().map(Arc::from),
            route_count: self.routes.len(),
        })
    }

    /// Serve until `shutdown` triggers, then drain within the grace period.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.routes.len(), "Mock server starting");

        let mut stop_accepting = shutdown.subscribe();
        let mut drain_started = shutdown.subscribe();

        tokio::spawn(self.tracker.clone().run(shutdown.subscribe()));

        let reporter = StateReporter::new(
            self.simulation.clone(),
            self.tracker.clone(),
            Duration::from_secs(self.config.observability.report_interval_secs),
        );
        tokio::spawn(reporter.run(shutdown.subscribe()));

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");

            let admin = self.admin_router(shutdown.clone());
            let mut admin_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API failed");
                }
            });
        }

        let grace = Duration::from_millis(self.config.timeouts.shutdown_grace_ms);
        let server = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop_accepting.recv().await;
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            served = &mut server => served?,
            _ = drain_started.recv() => {
                tracing::info!(grace = ?grace, "Draining connections");
                match tokio::time::timeout(grace, &mut server).await {
                    Ok(served) => served?,
                    Err(_) => {
                        tracing::error!(grace = ?grace, "Connections did not drain in time");
                        return Err(ServerError::ShutdownTimeout(grace));
                    }
                }
            }
        }

        tracing::info!("Mock server stopped");
        Ok(())
    }
}

/// Look up the route and run its pipeline.
async fn dispatch(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(matched) = state.routes.lookup(&method, &path) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), "unmatched", StatusCode::NOT_FOUND.as_u16(), start);
        return (StatusCode::NOT_FOUND, format!("Cannot {} {}", method, path)).into_response();
    };

    request.extensions_mut().insert(matched.params);
    let pipeline = matched.pipeline;
    let response = pipeline.run(&state.deps, request).await;

    metrics::record_request(method.as_str(), &pipeline.key().path, response.status().as_u16(), start);
    response
}
