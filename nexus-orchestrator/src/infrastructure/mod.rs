//! Orchestrator infrastructure layer

pub mod job_worker;
pub mod plugin_registry;
pub mod report_store;
pub mod task_queue;

pub use job_worker::*;
pub use plugin_registry::PluginRegistry;
pub use report_store::*;
pub use task_queue::*;
