//! Orchestrator domain entities

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_core::domain::udm::UnifiedDataModel;

use super::value_objects::{JobId, JobStatus, NativeTaskState};

/// Persisted record of one analysis job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub job_id: JobId,
    /// Absolute path of the analyzed project
    pub project_path: String,
    pub status: JobStatus,
    /// Human readable status line, or the error text once failed
    pub summary: Option<String>,
    /// Last checkpoint reached; recorded on the terminal transition
    #[serde(default)]
    pub progress: u8,
    pub udm: Option<UnifiedDataModel>,
    pub created_at: DateTime<Utc>,
    /// Set on the terminal transition only
    pub completed_at: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
}

impl AnalysisReport {
    pub fn new(job_id: JobId, project_path: impl Into<String>, owner_id: Option<Uuid>) -> Self {
        Self {
            job_id,
            project_path: project_path.into(),
            status: JobStatus::Pending,
            summary: None,
            progress: 0,
            udm: None,
            created_at: Utc::now(),
            completed_at: None,
            owner_id,
        }
    }

    /// Apply a status update in place
    ///
    /// `completed_at` is stamped when a payload arrives or the job fails.
    pub fn apply(&mut self, update: ReportUpdate) {
        self.status = update.status;
        if update.summary.is_some() {
            self.summary = update.summary;
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(100);
        }
        let stamps_completion = update.udm.is_some() || update.status == JobStatus::Failed;
        if update.udm.is_some() {
            self.udm = update.udm;
        }
        if stamps_completion {
            self.completed_at = Some(Utc::now());
        }
    }
}

/// Status change requested by the workflow
#[derive(Debug, Clone, PartialEq)]
pub struct ReportUpdate {
    pub status: JobStatus,
    pub summary: Option<String>,
    pub progress: Option<u8>,
    pub udm: Option<UnifiedDataModel>,
}

impl ReportUpdate {
    pub fn status(status: JobStatus, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: Some(summary.into()),
            progress: None,
            udm: None,
        }
    }

    pub fn failed(error: impl Into<String>, progress: u8) -> Self {
        Self {
            status: JobStatus::Failed,
            summary: Some(error.into()),
            progress: Some(progress),
            udm: None,
        }
    }

    pub fn completed(summary: impl Into<String>, udm: UnifiedDataModel) -> Self {
        Self {
            status: JobStatus::Completed,
            summary: Some(summary.into()),
            progress: Some(100),
            udm: Some(udm),
        }
    }
}

/// Last progress checkpoint emitted by a running job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub progress: u8,
    pub message: String,
}

impl JobProgress {
    pub fn new(progress: u8, message: impl Into<String>) -> Self {
        Self {
            progress: progress.min(100),
            message: message.into(),
        }
    }
}

/// Backend-independent status returned by read paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub status: JobStatus,
    pub progress: u8,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Message handed to the worker pool through the task queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub job_id: JobId,
    pub project_path: PathBuf,
}

/// Native state and metadata the queue keeps for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub state: NativeTaskState,
    #[serde(default)]
    pub info: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl TaskSnapshot {
    pub fn new(state: NativeTaskState, info: serde_json::Value) -> Self {
        Self {
            state,
            info,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_update_keeps_completion_unset() {
        let mut report = AnalysisReport::new(JobId::from("job-1"), "/tmp/project", None);
        report.apply(ReportUpdate::status(JobStatus::Running, "Analyzer started"));

        assert_eq!(report.status, JobStatus::Running);
        assert_eq!(report.summary.as_deref(), Some("Analyzer started"));
        assert!(report.completed_at.is_none());
    }

    #[test]
    fn failed_update_stamps_completion() {
        let mut report = AnalysisReport::new(JobId::from("job-1"), "/tmp/project", None);
        report.apply(ReportUpdate::status(JobStatus::Failed, "boom"));

        assert_eq!(report.summary.as_deref(), Some("boom"));
        assert!(report.completed_at.is_some());
        assert!(report.udm.is_none());
    }

    #[test]
    fn failed_update_keeps_last_checkpoint() {
        let mut report = AnalysisReport::new(JobId::from("job-1"), "/tmp/project", None);
        report.apply(ReportUpdate::status(JobStatus::Running, "Analyzer started"));
        assert_eq!(report.progress, 0);

        report.apply(ReportUpdate::failed("boom", 10));
        assert_eq!(report.progress, 10);
        assert_eq!(report.summary.as_deref(), Some("boom"));
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(JobProgress::new(250, "over").progress, 100);
    }

    #[test]
    fn queued_task_serializes_path() {
        let task = QueuedTask {
            job_id: JobId::from("abc"),
            project_path: PathBuf::from("/srv/project"),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["job_id"], "abc");
        assert_eq!(value["project_path"], "/srv/project");
    }
}
