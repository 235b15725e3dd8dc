//! Status reconciliation
//!
//! Read paths never expose backend states directly. Queue states are mapped
//! through [`reconcile`]; inline jobs are first translated into the
//! equivalent queue state by [`native_state_for`] so both modes share one
//! mapping.

use serde_json::{Value, json};

use crate::domain::entities::{AnalysisReport, JobProgress, StatusView};
use crate::domain::value_objects::{JobStatus, NativeTaskState};

const DEFAULT_RUNNING_PROGRESS: u8 = 25;

/// Map a native task state and its metadata into a [`StatusView`].
///
/// | state                       | status    | progress         | message                      |
/// |-----------------------------|-----------|------------------|------------------------------|
/// | PENDING, RECEIVED, QUEUED   | pending   | 0                | "Queued for analysis"        |
/// | STARTED, PROGRESS           | running   | meta or 25       | meta or "Analyzer running"   |
/// | SUCCESS                     | completed | 100              | "Analysis completed"         |
/// | FAILURE, REVOKED            | failed    | meta or 0        | meta or "Analysis failed"    |
/// | anything else               | pending   | 0                | "Pending"                    |
///
/// Failed views carry `error` = `meta.detail`, falling back to the message.
pub fn reconcile(state: &NativeTaskState, info: &Value) -> StatusView {
    match state {
        NativeTaskState::Pending | NativeTaskState::Received | NativeTaskState::Queued => {
            StatusView {
                status: JobStatus::Pending,
                progress: 0,
                message: Some("Queued for analysis".to_string()),
                error: None,
            }
        }
        NativeTaskState::Started | NativeTaskState::Progress => StatusView {
            status: JobStatus::Running,
            progress: meta_progress(info).unwrap_or(DEFAULT_RUNNING_PROGRESS),
            message: Some(meta_text(info, "message").unwrap_or_else(|| "Analyzer running".into())),
            error: None,
        },
        NativeTaskState::Success => StatusView {
            status: JobStatus::Completed,
            progress: 100,
            message: Some("Analysis completed".to_string()),
            error: None,
        },
        NativeTaskState::Failure | NativeTaskState::Revoked => {
            let message = meta_text(info, "message").unwrap_or_else(|| "Analysis failed".into());
            let error = meta_text(info, "detail").unwrap_or_else(|| message.clone());
            StatusView {
                status: JobStatus::Failed,
                progress: meta_progress(info).unwrap_or(0),
                message: Some(message),
                error: Some(error),
            }
        }
        NativeTaskState::Other(_) => StatusView {
            status: JobStatus::Pending,
            progress: 0,
            message: Some("Pending".to_string()),
            error: None,
        },
    }
}

/// Translate a stored record (and its last checkpoint) into a native state
///
/// Terminal records carry their own progress, so `checkpoint` only matters
/// while the job runs.
pub fn native_state_for(
    report: &AnalysisReport,
    checkpoint: Option<&JobProgress>,
) -> (NativeTaskState, Value) {
    match report.status {
        JobStatus::Pending => (NativeTaskState::Pending, json!({})),
        JobStatus::Running => match checkpoint {
            Some(checkpoint) => (
                NativeTaskState::Progress,
                json!({"progress": checkpoint.progress, "message": checkpoint.message}),
            ),
            None => (
                NativeTaskState::Started,
                json!({"message": report.summary}),
            ),
        },
        JobStatus::Completed => (NativeTaskState::Success, json!({})),
        JobStatus::Failed => (
            NativeTaskState::Failure,
            json!({
                "progress": report.progress,
                "message": report.summary,
                "detail": report.summary,
            }),
        ),
    }
}

/// `info.progress` as a percentage, clamped to 0..=100
fn meta_progress(info: &Value) -> Option<u8> {
    let raw = info.get("progress")?;
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, 100.0) as u8)
}

/// Non-empty string metadata field
fn meta_text(info: &Value, key: &str) -> Option<String> {
    match info.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
