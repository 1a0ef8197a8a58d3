//! Artificial latency.

use std::time::Duration;
use rand::Rng;

/// Configured latency of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySpec {
    /// Always the same duration.
    Fixed(Duration),
    /// Uniformly drawn from `[min, max)`.
    Range { min: Duration, max: Duration },
}

/// Compute the delay for one request, scaled by the global delay factor.
///
/// A negative or NaN factor counts as zero.
pub fn compute_delay(spec: &DelaySpec, factor: f64) -> Duration {
    let base_ms = match *spec {
        DelaySpec::Fixed(d) => millis(d),
        DelaySpec::Range { min, max } => {
            let (min_ms, max_ms) = (millis(min), millis(max));
            if max_ms > min_ms {
                rand::thread_rng().gen_range(min_ms..max_ms)
            } else {
                min_ms
            }
        }
    };

    let factor = factor.max(0.0);
    // `as` saturates, so absurd factors cannot overflow.
    Duration::from_nanos((base_ms * factor * 1_000_000.0) as u64)
}

fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}
