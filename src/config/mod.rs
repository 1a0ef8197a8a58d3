//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML or JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks on global settings)
//!     → MockConfig (validated, immutable)
//!     → endpoint.rs (resolve entries into EndpointDescriptors)
//!     → pipeline builder (one Pipeline per descriptor)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no runtime route mutation
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod endpoint;
pub mod loader;
pub mod schema;
pub mod validation;

pub use endpoint::{resolve_endpoints, EndpointDescriptor, HttpMethod, ResponseSource};
pub use loader::{load_config, parse_config};
pub use schema::{
    AdminConfig, DelayConfig, EndpointConfig, ListenerConfig, MockConfig, ObservabilityConfig,
    RateBucketConfig, SecurityConfig, SimulationConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
