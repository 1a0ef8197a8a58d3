//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing)
//!     → routing (route table lookup, 404 when nothing matches)
//!     → pipeline (per-route stages)
//!     → body.rs (buffer and decode bodies for non-proxy routes)
//!     → Send to client
//! ```

pub mod body;
pub mod server;

pub use body::ParsedBody;
pub use server::{AppState, MockServer};
