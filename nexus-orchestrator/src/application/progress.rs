//! In-process progress tracking for inline jobs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::JobProgress;
use crate::domain::services::ProgressReporter;
use crate::domain::value_objects::JobId;

/// Last checkpoint per running job
///
/// Entries are dropped once the job ends; terminal records keep their own
/// progress.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    checkpoints: RwLock<HashMap<JobId, JobProgress>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, job_id: &JobId) -> Option<JobProgress> {
        self.checkpoints.read().await.get(job_id).cloned()
    }

    /// Forget a finished job
    pub async fn remove(&self, job_id: &JobId) -> Option<JobProgress> {
        self.checkpoints.write().await.remove(job_id)
    }

    pub async fn len(&self) -> usize {
        self.checkpoints.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.checkpoints.read().await.is_empty()
    }
}

#[async_trait]
impl ProgressReporter for ProgressTracker {
    async fn checkpoint(&self, job_id: &JobId, progress: u8, message: &str) {
        self.checkpoints
            .write()
            .await
            .insert(job_id.clone(), JobProgress::new(progress, message));
    }
}
