//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Build pipelines → Bind listener → Spawn background tasks → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The admin API and OS signals share one shutdown trigger
//! - Shutdown has a deadline: `ShutdownTimeout` after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
