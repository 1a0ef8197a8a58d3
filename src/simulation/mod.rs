//! Fault and latency simulation subsystem.
//!
//! # Data Flow
//! ```text
//! Operator (admin API / mock-cli)
//!     → state.rs (delay factor, fail probability, view index)
//!
//! Every request pipeline:
//!     → delay.rs  (configured delay × live delay factor)
//!     → fail.rs   (draw against live fail probability → 503)
//! ```
//!
//! # Design Decisions
//! - One shared state handle, passed explicitly; no ambient globals
//! - The delay stage is the only designed suspension point of a request
//! - A simulated failure is expected behavior, not an error

pub mod delay;
pub mod fail;
pub mod state;

pub use delay::{compute_delay, DelaySpec};
pub use fail::should_fail;
pub use state::{SimulationSnapshot, SimulationState, DIAL_STEP};
