//! Orchestrator domain services
//!
//! The report store and the task queue are the two external collaborators the
//! job subsystem depends on. Both are traits so the same workflow runs against
//! PostgreSQL/Redis in production and in-memory doubles in tests.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{AnalysisReport, QueuedTask, ReportUpdate, TaskSnapshot};
use super::value_objects::{JobId, NativeTaskState};

/// Persistent job records
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new record in `pending`
    async fn create(
        &self,
        job_id: &JobId,
        project_path: &str,
        owner_id: Option<Uuid>,
    ) -> Result<AnalysisReport, ReportStoreError>;

    /// Apply a status update; unknown ids are `NotFound`
    async fn update(
        &self,
        job_id: &JobId,
        update: ReportUpdate,
    ) -> Result<AnalysisReport, ReportStoreError>;

    async fn get(&self, job_id: &JobId) -> Result<Option<AnalysisReport>, ReportStoreError>;

    /// Records owned by `owner_id`, newest first
    async fn list(&self, owner_id: Uuid) -> Result<Vec<AnalysisReport>, ReportStoreError>;
}

/// Report store errors
#[derive(Debug, thiserror::Error)]
pub enum ReportStoreError {
    #[error("Report not found: {0}")]
    NotFound(JobId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Report already exists: {0}")]
    Duplicate(JobId),
}

/// Distributed task queue with a result store
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Mint the id the next enqueued task will carry
    fn next_task_id(&self) -> JobId;

    async fn enqueue(&self, task: QueuedTask) -> Result<(), TaskQueueError>;

    /// Block up to `timeout` for the next task
    async fn dequeue(&self, timeout: Duration) -> Result<Option<QueuedTask>, TaskQueueError>;

    /// Record a native state in the result store
    async fn report_state(
        &self,
        job_id: &JobId,
        state: NativeTaskState,
        info: serde_json::Value,
    ) -> Result<(), TaskQueueError>;

    /// `None` once the result has expired or the id was never seen
    async fn get_state(&self, job_id: &JobId) -> Result<Option<TaskSnapshot>, TaskQueueError>;
}

/// Task queue errors
#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    #[error("Failed to enqueue task: {0}")]
    EnqueueFailed(String),

    #[error("Queue backend error: {0}")]
    Backend(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sink for progress checkpoints
///
/// Checkpoints are best effort: implementations log and swallow their own
/// failures so a flaky progress channel never fails a job.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn checkpoint(&self, job_id: &JobId, progress: u8, message: &str);
}
