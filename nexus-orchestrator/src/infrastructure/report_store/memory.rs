use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{AnalysisReport, ReportUpdate};
use crate::domain::services::{ReportStore, ReportStoreError};
use crate::domain::value_objects::JobId;

/// Process-local report store
///
/// Used when `database.url = "memory"` and as the store in tests. Records are
/// lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<JobId, AnalysisReport>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create(
        &self,
        job_id: &JobId,
        project_path: &str,
        owner_id: Option<Uuid>,
    ) -> Result<AnalysisReport, ReportStoreError> {
        let mut reports = self.reports.write().await;
        if reports.contains_key(job_id) {
            return Err(ReportStoreError::Duplicate(job_id.clone()));
        }

        let report = AnalysisReport::new(job_id.clone(), project_path, owner_id);
        reports.insert(job_id.clone(), report.clone());
        Ok(report)
    }

    async fn update(
        &self,
        job_id: &JobId,
        update: ReportUpdate,
    ) -> Result<AnalysisReport, ReportStoreError> {
        let mut reports = self.reports.write().await;
        let report = reports
            .get_mut(job_id)
            .ok_or_else(|| ReportStoreError::NotFound(job_id.clone()))?;

        report.apply(update);
        Ok(report.clone())
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<AnalysisReport>, ReportStoreError> {
        Ok(self.reports.read().await.get(job_id).cloned())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<AnalysisReport>, ReportStoreError> {
        let mut owned: Vec<AnalysisReport> = self
            .reports
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == Some(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
