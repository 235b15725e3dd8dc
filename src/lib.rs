//! Nexus - analyzer plugin orchestration and job lifecycle engine
//!
//! This is the bootstrap crate that wires the core and orchestrator crates
//! into a running process.

mod app;
pub mod infra;
mod workers;

pub use app::{AppContext, AppError, BUILTIN_PLUGINS};
pub use nexus_core::{Config, init_tracing};

// Re-export for convenience
pub use nexus_core;
pub use nexus_orchestrator;
