//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered scan over the route table)
//!     → matcher.rs (segment match, parameter capture)
//!     → Return: matched Pipeline + PathParams, or no match (404)
//!
//! Route Compilation (at startup):
//!     EndpointDescriptor[]
//!     → Parse patterns
//!     → Build one Pipeline per (pattern, method)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: first declared match wins

pub mod matcher;
pub mod router;

pub use matcher::{PathParams, PathPattern};
pub use router::{RouteEntry, RouteMatch, RouteTable};
