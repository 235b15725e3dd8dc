//! Job execution
//!
//! [`JobExecutor`] wraps one orchestrator run as a tracked job. Both execution
//! modes go through it, so the persisted transitions and checkpoints are the
//! same whichever backend picked the job up.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use nexus_core::domain::udm::UnifiedDataModel;

use crate::application::orchestrator::{AnalysisError, AnalysisOrchestrator};
use crate::application::workflow::{JobWorkflow, WorkflowError};
use crate::domain::services::ProgressReporter;
use crate::domain::value_objects::JobId;

pub const CHECKPOINT_PREPARING_ANALYZERS: (u8, &str) = (10, "Preparing analyzers");
pub const CHECKPOINT_PREPARING_REPORT: (u8, &str) = (85, "Preparing report");

/// Errors surfaced while executing a job
///
/// Displays as the underlying error so the text stored on the failed record
/// and the text reported to the queue are the same.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Runs the orchestrator for one job and persists the outcome
#[derive(Clone)]
pub struct JobExecutor {
    orchestrator: Arc<AnalysisOrchestrator>,
    workflow: Arc<JobWorkflow>,
}

impl JobExecutor {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>, workflow: Arc<JobWorkflow>) -> Self {
        Self {
            orchestrator,
            workflow,
        }
    }

    /// Execute the job and return its payload.
    ///
    /// On any failure after the job started, the record is moved to `failed`
    /// with the error text and the last checkpoint before the error is
    /// returned.
    pub async fn execute(
        &self,
        job_id: &JobId,
        project_path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<UnifiedDataModel, JobExecutionError> {
        info!(job_id = %job_id, path = %project_path.display(), "Starting analysis");

        // Pending → Running
        self.workflow.start_job(job_id).await?;

        let (mut reached, message) = CHECKPOINT_PREPARING_ANALYZERS;
        progress.checkpoint(job_id, reached, message).await;

        let outcome = match self.orchestrator.analyze(project_path).await {
            Ok(udm) => {
                let (pct, message) = CHECKPOINT_PREPARING_REPORT;
                progress.checkpoint(job_id, pct, message).await;
                reached = pct;

                // Running → Completed
                match self.workflow.complete_job(job_id, udm.clone()).await {
                    Ok(_) => Ok(udm),
                    Err(e) => Err(JobExecutionError::Workflow(e)),
                }
            }
            Err(e) => Err(JobExecutionError::Analysis(e)),
        };

        match outcome {
            Ok(udm) => {
                info!(job_id = %job_id, path = %project_path.display(), "Completed analysis");
                Ok(udm)
            }
            Err(err) => {
                // Running → Failed
                if let Err(persist_err) = self
                    .workflow
                    .fail_job_at(job_id, &err.to_string(), reached)
                    .await
                {
                    error!(
                        job_id = %job_id,
                        error = %persist_err,
                        "Failed to transition job to Failed"
                    );
                }
                Err(err)
            }
        }
    }
}
