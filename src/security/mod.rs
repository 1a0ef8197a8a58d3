//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request (inside its pipeline):
//!     → cors.rs (permissive CORS headers, preflight answers)
//!     → rate_limit.rs (per-route fixed-window admission)
//!     → body limit enforced by the body-parsing stage
//! ```
//!
//! # Design Decisions
//! - Both gates are opt-in per endpoint
//! - Rejections keep headers already written by earlier stages

pub mod cors;
pub mod rate_limit;

pub use cors::{CorsOutcome, CorsPolicy};
pub use rate_limit::FixedWindowLimiter;
