//! Orchestrator application layer

pub mod canonical_model;
pub mod dispatch;
pub mod execution;
pub mod orchestrator;
pub mod progress;
pub mod reconciler;
pub mod workflow;

pub use canonical_model::{CanonicalModelBuilder, CanonicalModelError};
pub use dispatch::{DispatchError, ExecutionBackend, JobDispatcher};
pub use execution::{JobExecutionError, JobExecutor};
pub use orchestrator::{AnalysisError, AnalysisOrchestrator};
pub use progress::ProgressTracker;
pub use reconciler::reconcile;
pub use workflow::{JobWorkflow, WorkflowError};
