//! Mediagate - Main application library
//!
//! This is the main binary crate that wires the core services into the HTTP surface

mod app;

pub use app::{AppHandle, create_app, create_app_with};
pub use mediagate_core::{Config, init_tracing};
pub use mediagate_orchestrator::presentation::OrchestratorState;

// Re-export for convenience
pub use mediagate_core;
pub use mediagate_orchestrator;
