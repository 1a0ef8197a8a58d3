//! Operator control surface.
//!
//! # Routes
//! - `GET  /admin/status`: version, route count, simulation state
//! - `GET  /admin/simulation`, `PUT /admin/simulation`: read or set the dials
//! - `POST /admin/simulation/{knob}/{direction}`: step a dial up or down
//! - `GET  /admin/rates`: rolling request rates
//! - `POST /admin/shutdown`: graceful shutdown
//!
//! # Design Decisions
//! - Served on its own listener, never next to mocked routes
//! - Bearer-token auth only when an API key is configured

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::lifecycle::Shutdown;
use crate::observability::RateTracker;
use crate::simulation::SimulationState;

use self::auth::admin_auth_middleware;
use self::handlers::*;

#[derive(Clone)]
pub struct AdminState {
    pub simulation: Arc<SimulationState>,
    pub tracker: Arc<RateTracker>,
    pub shutdown: Shutdown,
    pub api_key: Option<Arc<str>>,
    pub route_count: usize,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/simulation", get(get_simulation).put(put_simulation))
        .route("/admin/simulation/{knob}/{direction}", post(step_simulation))
        .route("/admin/rates", get(get_rates))
        .route("/admin/shutdown", post(post_shutdown))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
