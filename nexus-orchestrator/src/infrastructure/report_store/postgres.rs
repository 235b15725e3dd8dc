use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{AnalysisReport, ReportUpdate};
use crate::domain::services::{ReportStore, ReportStoreError};
use crate::domain::value_objects::{JobId, JobStatus};

const REPORT_COLUMNS: &str =
    "job_id, project_path, status, summary, progress, udm, created_at, completed_at, owner_id";

/// Row of the `analysis_reports` table
#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    job_id: String,
    project_path: String,
    status: String,
    summary: Option<String>,
    progress: i16,
    udm: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    owner_id: Option<Uuid>,
}

impl TryFrom<ReportRow> for AnalysisReport {
    type Error = ReportStoreError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status).ok_or_else(|| {
            ReportStoreError::Serialization(format!("Unknown job status: {}", row.status))
        })?;
        let udm = row
            .udm
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ReportStoreError::Serialization(e.to_string()))?;

        Ok(AnalysisReport {
            job_id: JobId::from(row.job_id),
            project_path: row.project_path,
            status,
            summary: row.summary,
            progress: row.progress.clamp(0, 100) as u8,
            udm,
            created_at: row.created_at,
            completed_at: row.completed_at,
            owner_id: row.owner_id,
        })
    }
}

/// SQLx implementation of the report store
pub struct PostgresReportStore {
    pool: Arc<PgPool>,
}

impl PostgresReportStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn database_error(context: &str, e: sqlx::Error) -> ReportStoreError {
    tracing::error!("Database error {}: {}", context, e);
    ReportStoreError::Database(e.to_string())
}

#[async_trait]
impl ReportStore for PostgresReportStore {
    async fn create(
        &self,
        job_id: &JobId,
        project_path: &str,
        owner_id: Option<Uuid>,
    ) -> Result<AnalysisReport, ReportStoreError> {
        let query = format!(
            "INSERT INTO analysis_reports (job_id, project_path, status, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {REPORT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(job_id.as_str())
            .bind(project_path)
            .bind(JobStatus::Pending.as_str())
            .bind(owner_id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return ReportStoreError::Duplicate(job_id.clone());
                    }
                }
                database_error("creating report", e)
            })?;

        row.try_into()
    }

    async fn update(
        &self,
        job_id: &JobId,
        update: ReportUpdate,
    ) -> Result<AnalysisReport, ReportStoreError> {
        let udm = update
            .udm
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ReportStoreError::Serialization(e.to_string()))?;

        let query = format!(
            "UPDATE analysis_reports
             SET status = $2,
                 summary = COALESCE($3, summary),
                 progress = COALESCE($5, progress),
                 udm = COALESCE($4::jsonb, udm),
                 completed_at = CASE
                     WHEN $4::jsonb IS NOT NULL OR $2 = 'failed' THEN NOW()
                     ELSE completed_at
                 END
             WHERE job_id = $1
             RETURNING {REPORT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(job_id.as_str())
            .bind(update.status.as_str())
            .bind(update.summary)
            .bind(udm)
            .bind(update.progress.map(i16::from))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| database_error("updating report", e))?
            .ok_or_else(|| ReportStoreError::NotFound(job_id.clone()))?;

        row.try_into()
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<AnalysisReport>, ReportStoreError> {
        let query = format!("SELECT {REPORT_COLUMNS} FROM analysis_reports WHERE job_id = $1");

        sqlx::query_as::<_, ReportRow>(&query)
            .bind(job_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| database_error("finding report", e))?
            .map(AnalysisReport::try_from)
            .transpose()
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<AnalysisReport>, ReportStoreError> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM analysis_reports
             WHERE owner_id = $1
             ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, ReportRow>(&query)
            .bind(owner_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| database_error("listing reports", e))?
            .into_iter()
            .map(AnalysisReport::try_from)
            .collect()
    }
}
