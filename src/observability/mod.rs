//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every matched request:
//!     → rate_buckets.rs (rolling per-route request counts)
//!     → metrics.rs (Prometheus counters, histograms)
//!
//! Background:
//!     → rate_buckets.rs ticker (rotates the ring)
//!     → logging.rs reporter (state + rates to the log)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing
//! - Rolling rates are kept in constant memory per route
//! - Prometheus export is opt-in

pub mod logging;
pub mod metrics;
pub mod rate_buckets;

pub use rate_buckets::{RateTracker, SeriesKey, SeriesRate};
