//! Orchestrator domain layer

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;

// Re-export plugin and UDM types from core for convenience
pub use nexus_core::domain::plugin::{AnalyzerPlugin, PluginError, PluginFactory};
pub use nexus_core::domain::udm::UnifiedDataModel;
