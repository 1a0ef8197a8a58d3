use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::observability::SeriesRate;
use crate::simulation::{SimulationSnapshot, DIAL_STEP};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub simulation: SimulationSnapshot,
}

/// Partial update of the dials; absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationUpdate {
    pub delay_factor: Option<f64>,
    pub fail_probability: Option<f64>,
    pub view_index: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Knob {
    DelayFactor,
    FailProbability,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.route_count,
        simulation: state.simulation.snapshot(),
    })
}

pub async fn get_simulation(State(state): State<AdminState>) -> Json<SimulationSnapshot> {
    Json(state.simulation.snapshot())
}

pub async fn put_simulation(
    State(state): State<AdminState>,
    Json(update): Json<SimulationUpdate>,
) -> Json<SimulationSnapshot> {
    let simulation = &state.simulation;
    if let Some(factor) = update.delay_factor {
        simulation.set_delay_factor(factor);
    }
    if let Some(probability) = update.fail_probability {
        simulation.set_fail_probability(probability);
    }
    if let Some(view) = update.view_index {
        simulation.set_view_index(view);
    }

    let snapshot = simulation.snapshot();
    tracing::info!(
        delay_factor = snapshot.delay_factor,
        fail_probability = snapshot.fail_probability,
        view_index = snapshot.view_index,
        "Simulation updated"
    );
    Json(snapshot)
}

pub async fn step_simulation(
    State(state): State<AdminState>,
    Path((knob, direction)): Path<(Knob, Direction)>,
) -> Json<SimulationSnapshot> {
    let simulation = &state.simulation;
    let delta = match direction {
        Direction::Up => DIAL_STEP,
        Direction::Down => -DIAL_STEP,
    };

    match (knob, direction) {
        (Knob::DelayFactor, _) => {
            simulation.adjust_delay_factor(delta);
        }
        (Knob::FailProbability, _) => {
            simulation.adjust_fail_probability(delta);
        }
        (Knob::View, Direction::Up) => {
            simulation.next_view();
        }
        (Knob::View, Direction::Down) => {
            simulation.previous_view();
        }
    }

    let snapshot = simulation.snapshot();
    tracing::info!(?knob, ?direction, ?snapshot, "Simulation stepped");
    Json(snapshot)
}

pub async fn get_rates(State(state): State<AdminState>) -> Json<Vec<SeriesRate>> {
    Json(state.tracker.snapshot())
}

pub async fn post_shutdown(State(state): State<AdminState>) -> (StatusCode, Json<serde_json::Value>) {
    tracing::info!("Shutdown requested through admin API");
    state.shutdown.trigger();
    (StatusCode::ACCEPTED, Json(serde_json::json!({ "status": "shutting_down" })))
}
