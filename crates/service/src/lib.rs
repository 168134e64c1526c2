//! HTTP service for the Cassette bundle gateway.
//!
//! This crate provides the components the gateway binary serves:
//! - State management (ServiceState: bundle registry, rebuild trigger, url generation)
//! - Bundle routes, one per bundle kind, with ETag validation
//! - Diagnostics page and cache rebuild endpoint
//! - Health checks

pub mod config;
pub mod http;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use state::{Settings, State as ServiceState, StateSetupError};
