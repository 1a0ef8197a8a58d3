//! Global simulation dials.
//!
//! # Responsibilities
//! - Hold the live delay factor, fail probability and view index
//! - Clamp every write into its legal range
//!
//! # Design Decisions
//! - Each dial is an independent atomic; no cross-field consistency
//! - f64 values are stored as their bit pattern in an `AtomicU64`
//! - Shared through `Arc`, injected into every pipeline

use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Step used by the operator controls for both float dials.
pub const DIAL_STEP: f64 = 0.1;

/// A float stored in an `AtomicU64`.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Apply `f` atomically and return the new value.
    fn update(&self, f: impl Fn(f64) -> f64) -> f64 {
        let mut result = 0.0;
        let _ = self.0.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            result = f(f64::from_bits(bits));
            Some(result.to_bits())
        });
        result
    }
}

/// Point-in-time copy of the dials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub delay_factor: f64,
    pub fail_probability: f64,
    pub view_index: u64,
}

/// Process-wide simulation state.
#[derive(Debug)]
pub struct SimulationState {
    delay_factor: AtomicF64,
    fail_probability: AtomicF64,
    view_index: AtomicU64,
}

impl SimulationState {
    pub fn new(delay_factor: f64, fail_probability: f64) -> Self {
        Self {
            delay_factor: AtomicF64::new(clamp_factor(delay_factor)),
            fail_probability: AtomicF64::new(clamp_probability(fail_probability)),
            view_index: AtomicU64::new(0),
        }
    }

    pub fn delay_factor(&self) -> f64 {
        self.delay_factor.load()
    }

    pub fn set_delay_factor(&self, value: f64) -> f64 {
        let value = clamp_factor(value);
        self.delay_factor.store(value);
        value
    }

    /// Add `delta` (rounded to two decimals, floored at 0) and return the new factor.
    pub fn adjust_delay_factor(&self, delta: f64) -> f64 {
        self.delay_factor
            .update(|current| clamp_factor(round2(current + delta)))
    }

    pub fn fail_probability(&self) -> f64 {
        self.fail_probability.load()
    }

    pub fn set_fail_probability(&self, value: f64) -> f64 {
        let value = clamp_probability(value);
        self.fail_probability.store(value);
        value
    }

    /// Add `delta` (rounded to two decimals, clamped to [0, 1]) and return the new probability.
    pub fn adjust_fail_probability(&self, delta: f64) -> f64 {
        self.fail_probability
            .update(|current| clamp_probability(round2(current + delta)))
    }

    pub fn view_index(&self) -> u64 {
        self.view_index.load(Ordering::Relaxed)
    }

    pub fn set_view_index(&self, value: u64) {
        self.view_index.store(value, Ordering::Relaxed);
    }

    pub fn next_view(&self) -> u64 {
        self.view_index.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement the view index, never below zero.
    pub fn previous_view(&self) -> u64 {
        let previous = self
            .view_index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            delay_factor: self.delay_factor(),
            fail_probability: self.fail_probability(),
            view_index: self.view_index(),
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_factor(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
