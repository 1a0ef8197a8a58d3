//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Periodically report simulation state and live request rates
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - The report only lists series that saw traffic in the window

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::rate_buckets::RateTracker;
use crate::simulation::SimulationState;

/// Install the global subscriber.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mock_server={level},tower_http={level}").into());

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Logs the dials and request rates on an interval.
pub struct StateReporter {
    simulation: Arc<SimulationState>,
    tracker: Arc<RateTracker>,
    interval: Duration,
}

impl StateReporter {
    pub fn new(simulation: Arc<SimulationState>, tracker: Arc<RateTracker>, interval: Duration) -> Self {
        Self {
            simulation,
            tracker,
            interval,
        }
    }

    pub fn report(&self) {
        let state = self.simulation.snapshot();
        tracing::info!(
            delay_factor = state.delay_factor,
            fail_probability = state.fail_probability,
            view_index = state.view_index,
            "Simulation state"
        );
        for rate in self.tracker.snapshot().into_iter().filter(|r| r.count > 0) {
            tracing::info!(method = %rate.method, path = %rate.path, count = rate.count, "Request rate");
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::debug!("State reporter disabled");
            return;
        }

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.report(),
                _ = shutdown.recv() => break,
            }
        }
    }
}
