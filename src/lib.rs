//! Configurable HTTP mock server.
//!
//! Endpoints are declared in a config file. Each one gets a pipeline of
//! stages (rate observation, CORS, rate limiting, simulated latency, body
//! parsing, response metadata, simulated failure) ending in a response
//! producer: a JSON template, a text file, a reverse proxy, a custom handler
//! or no content at all. Latency and failure are driven by process-wide
//! dials that an operator adjusts at runtime through the admin API.

// Core subsystems
pub mod config;
pub mod http;
pub mod pipeline;
pub mod response;
pub mod routing;

// Behavior knobs
pub mod security;
pub mod simulation;

// Cross-cutting concerns
pub mod admin;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::MockConfig;
pub use error::{ConfigError, ServerError};
pub use http::MockServer;
pub use lifecycle::Shutdown;
pub use response::{CustomHandler, HandlerRegistry};
