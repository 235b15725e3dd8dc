//! Job dispatch and read paths
//!
//! [`JobDispatcher`] is the entry point used by outer layers. It creates the
//! job record, hands execution to the configured [`ExecutionBackend`] and
//! answers status and report reads with the same semantics for both modes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use uuid::Uuid;

use nexus_core::domain::udm::UnifiedDataModel;

use crate::application::execution::JobExecutor;
use crate::application::orchestrator::expand_home;
use crate::application::progress::ProgressTracker;
use crate::application::reconciler::{native_state_for, reconcile};
use crate::application::workflow::{JobWorkflow, WorkflowError};
use crate::domain::entities::{AnalysisReport, QueuedTask, StatusView};
use crate::domain::services::{TaskQueue, TaskQueueError};
use crate::domain::value_objects::{JobId, JobStatus};

/// Where accepted jobs run
#[derive(Clone)]
pub enum ExecutionBackend {
    /// Hand tasks to an external queue consumed by worker processes
    Distributed { queue: Arc<dyn TaskQueue> },
    /// Run tasks as tracked background tasks in this process
    Inline {
        tracker: TaskTracker,
        progress: Arc<ProgressTracker>,
    },
}

impl ExecutionBackend {
    pub fn inline(tracker: TaskTracker) -> Self {
        Self::Inline {
            tracker,
            progress: Arc::new(ProgressTracker::new()),
        }
    }

    pub fn distributed(queue: Arc<dyn TaskQueue>) -> Self {
        Self::Distributed { queue }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Distributed { .. } => "distributed",
            Self::Inline { .. } => "inline",
        }
    }
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Report for job {0} is not ready")]
    NotReady(JobId),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Queue(#[from] TaskQueueError),
}

/// Accepts jobs and serves their status and reports
#[derive(Clone)]
pub struct JobDispatcher {
    backend: ExecutionBackend,
    workflow: Arc<JobWorkflow>,
    executor: Arc<JobExecutor>,
}

impl JobDispatcher {
    pub fn new(
        backend: ExecutionBackend,
        workflow: Arc<JobWorkflow>,
        executor: Arc<JobExecutor>,
    ) -> Self {
        Self {
            backend,
            workflow,
            executor,
        }
    }

    pub fn backend(&self) -> &ExecutionBackend {
        &self.backend
    }

    /// Accept a job for `project_path` and return its id.
    ///
    /// The path is made absolute but not validated here; a bad path surfaces
    /// as a failed job.
    pub async fn submit(
        &self,
        project_path: impl AsRef<Path>,
        owner_id: Option<Uuid>,
    ) -> Result<JobId, DispatchError> {
        let project_path = absolute_project_path(project_path.as_ref());
        let stored_path = project_path.to_string_lossy().into_owned();

        match &self.backend {
            ExecutionBackend::Distributed { queue } => {
                let job_id = queue.next_task_id();
                self.workflow
                    .create_job(&job_id, &stored_path, owner_id)
                    .await?;

                let task = QueuedTask {
                    job_id: job_id.clone(),
                    project_path,
                };
                if let Err(e) = queue.enqueue(task).await {
                    error!(job_id = %job_id, error = %e, "Failed to enqueue analysis task");
                    if let Err(fail_err) = self.workflow.fail_job(&job_id, &e.to_string()).await {
                        error!(job_id = %job_id, error = %fail_err, "Failed to mark job as failed");
                    }
                    return Err(e.into());
                }

                info!(job_id = %job_id, path = %stored_path, "Analysis job enqueued");
                Ok(job_id)
            }
            ExecutionBackend::Inline { tracker, progress } => {
                let job_id = JobId::generate();
                self.workflow
                    .create_job(&job_id, &stored_path, owner_id)
                    .await?;

                let executor = self.executor.clone();
                let progress = progress.clone();
                let task_job_id = job_id.clone();
                tracker.spawn(async move {
                    if let Err(e) = executor
                        .execute(&task_job_id, &project_path, progress.as_ref())
                        .await
                    {
                        warn!(job_id = %task_job_id, error = %e, "Inline analysis job failed");
                    }
                    progress.remove(&task_job_id).await;
                });

                info!(job_id = %job_id, path = %stored_path, "Analysis job scheduled inline");
                Ok(job_id)
            }
        }
    }

    /// Current status of a job
    pub async fn status(&self, job_id: &JobId) -> Result<StatusView, DispatchError> {
        match &self.backend {
            ExecutionBackend::Distributed { queue } => {
                let snapshot = queue.get_state(job_id).await?;
                let record = self.workflow.get_job(job_id).await?;

                // A terminal record outranks any queue state short of a final one
                if let Some(record) = record.as_ref().filter(|r| r.status.is_terminal()) {
                    let queue_is_final = snapshot.as_ref().is_some_and(|s| s.state.is_ready());
                    if !queue_is_final {
                        let (state, info) = native_state_for(record, None);
                        return Ok(reconcile(&state, &info));
                    }
                }

                match (record, snapshot) {
                    (_, Some(snapshot)) => Ok(reconcile(&snapshot.state, &snapshot.info)),
                    (Some(record), None) => {
                        let (state, info) = native_state_for(&record, None);
                        Ok(reconcile(&state, &info))
                    }
                    (None, None) => Err(DispatchError::NotFound(job_id.clone())),
                }
            }
            ExecutionBackend::Inline { progress, .. } => {
                let record = self
                    .workflow
                    .get_job(job_id)
                    .await?
                    .ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
                let checkpoint = progress.get(job_id).await;
                let (state, info) = native_state_for(&record, checkpoint.as_ref());
                Ok(reconcile(&state, &info))
            }
        }
    }

    /// Final payload of a completed job
    pub async fn report(&self, job_id: &JobId) -> Result<UnifiedDataModel, DispatchError> {
        let record = self.workflow.get_job(job_id).await?;

        if let ExecutionBackend::Distributed { queue } = &self.backend {
            let still_open = record.as_ref().is_none_or(|r| !r.status.is_terminal());
            if still_open {
                // The worker may have died before it could update the record
                if let Some(snapshot) = queue.get_state(job_id).await? {
                    let view = reconcile(&snapshot.state, &snapshot.info);
                    if view.status == JobStatus::Failed {
                        return Err(DispatchError::JobFailed(failure_text(view)));
                    }
                }
            }
        }

        let record = record.ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
        match record.status {
            JobStatus::Failed => {
                let (state, info) = native_state_for(&record, None);
                Err(DispatchError::JobFailed(failure_text(reconcile(
                    &state, &info,
                ))))
            }
            JobStatus::Completed => record
                .udm
                .ok_or_else(|| DispatchError::NotReady(job_id.clone())),
            JobStatus::Pending | JobStatus::Running => {
                Err(DispatchError::NotReady(job_id.clone()))
            }
        }
    }

    /// Reports owned by `owner_id`, newest first
    pub async fn list_reports(&self, owner_id: Uuid) -> Result<Vec<AnalysisReport>, DispatchError> {
        Ok(self.workflow.list_jobs(owner_id).await?)
    }
}

fn failure_text(view: StatusView) -> String {
    view.error
        .or(view.message)
        .unwrap_or_else(|| "Analysis failed".to_string())
}

fn absolute_project_path(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    std::path::absolute(&expanded).unwrap_or(expanded)
}
