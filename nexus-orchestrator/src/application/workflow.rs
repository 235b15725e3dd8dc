//! Job Workflow: centralised state-machine controller for analysis jobs.
//!
//! Every status transition goes through [`JobWorkflow`], which reads the
//! stored record, validates the move against [`JobStatus::valid_transitions`]
//! and persists the update through the [`ReportStore`].
//!
//! ```text
//! Dispatcher / Executor     JobWorkflow            ReportStore
//!        │                       │                      │
//!        ├─ create_job() ───────►│── create ───────────►│  pending
//!        ├─ start_job() ────────►│── get / update ─────►│  running
//!        ├─ complete_job() ─────►│── get / update ─────►│  completed + udm
//!        └─ fail_job() ─────────►│── get / update ─────►│  failed + error text
//! ```

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use nexus_core::domain::udm::UnifiedDataModel;

use crate::domain::entities::{AnalysisReport, ReportUpdate};
use crate::domain::services::{ReportStore, ReportStoreError};
use crate::domain::value_objects::{JobId, JobStatus, JobTransitionError};

pub const SUMMARY_STARTED: &str = "Analyzer started";
pub const SUMMARY_COMPLETED: &str = "Analysis completed";

/// Errors from the workflow layer.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid state transition: {0}")]
    InvalidTransition(#[from] JobTransitionError),

    #[error("Persistence error: {0}")]
    Store(#[from] ReportStoreError),
}

/// Centralised job lifecycle controller.
#[derive(Clone)]
pub struct JobWorkflow {
    report_store: Arc<dyn ReportStore>,
}

impl JobWorkflow {
    pub fn new(report_store: Arc<dyn ReportStore>) -> Self {
        Self { report_store }
    }

    /// Persist a new job record in [`JobStatus::Pending`].
    pub async fn create_job(
        &self,
        job_id: &JobId,
        project_path: &str,
        owner_id: Option<Uuid>,
    ) -> Result<AnalysisReport, WorkflowError> {
        let report = self
            .report_store
            .create(job_id, project_path, owner_id)
            .await?;

        info!(job_id = %job_id, project_path, "Job created");
        Ok(report)
    }

    /// Transition a job to [`JobStatus::Running`].
    pub async fn start_job(&self, job_id: &JobId) -> Result<AnalysisReport, WorkflowError> {
        let report = self
            .transition(
                job_id,
                ReportUpdate::status(JobStatus::Running, SUMMARY_STARTED),
            )
            .await?;

        info!(job_id = %job_id, "Job transitioned to Running");
        Ok(report)
    }

    /// Transition a job to [`JobStatus::Completed`] and store its payload.
    pub async fn complete_job(
        &self,
        job_id: &JobId,
        udm: UnifiedDataModel,
    ) -> Result<AnalysisReport, WorkflowError> {
        let report = self
            .transition(job_id, ReportUpdate::completed(SUMMARY_COMPLETED, udm))
            .await?;

        info!(job_id = %job_id, "Job transitioned to Completed");
        Ok(report)
    }

    /// Transition a job to [`JobStatus::Failed`]; `error` becomes the summary.
    pub async fn fail_job(
        &self,
        job_id: &JobId,
        error: &str,
    ) -> Result<AnalysisReport, WorkflowError> {
        self.fail_job_at(job_id, error, 0).await
    }

    /// Like [`fail_job`](Self::fail_job), recording the last checkpoint reached.
    pub async fn fail_job_at(
        &self,
        job_id: &JobId,
        error: &str,
        progress: u8,
    ) -> Result<AnalysisReport, WorkflowError> {
        let report = self
            .transition(job_id, ReportUpdate::failed(error, progress))
            .await?;

        warn!(job_id = %job_id, error, progress, "Job transitioned to Failed");
        Ok(report)
    }

    /// Retrieve a job record by ID (delegates to store).
    pub async fn get_job(&self, job_id: &JobId) -> Result<Option<AnalysisReport>, WorkflowError> {
        Ok(self.report_store.get(job_id).await?)
    }

    /// Jobs owned by `owner_id`, newest first.
    pub async fn list_jobs(&self, owner_id: Uuid) -> Result<Vec<AnalysisReport>, WorkflowError> {
        Ok(self.report_store.list(owner_id).await?)
    }

    async fn transition(
        &self,
        job_id: &JobId,
        update: ReportUpdate,
    ) -> Result<AnalysisReport, WorkflowError> {
        let current = self
            .report_store
            .get(job_id)
            .await?
            .ok_or_else(|| ReportStoreError::NotFound(job_id.clone()))?;

        if !current.status.can_transition_to(&update.status) {
            return Err(JobTransitionError {
                from: current.status,
                to: update.status,
            }
            .into());
        }

        Ok(self.report_store.update(job_id, update).await?)
    }
}
