//! Background worker pool consuming the distributed task queue

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::application::execution::JobExecutor;
use crate::application::workflow::{SUMMARY_COMPLETED, SUMMARY_STARTED};
use crate::domain::entities::QueuedTask;
use crate::domain::services::TaskQueue;
use crate::domain::value_objects::{JobId, NativeTaskState};
use crate::infrastructure::task_queue::QueueProgressReporter;

const QUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Shared dependencies required by the job workers.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub executor: Arc<JobExecutor>,
    pub queue: Arc<dyn TaskQueue>,
}

/// Worker pool tuning
#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolSettings {
    pub max_concurrent_jobs: usize,
    /// How long one dequeue blocks before the loop re-checks for shutdown
    pub poll_timeout: Duration,
}

/// Spawn a worker pool that consumes queued tasks until `shutdown_token` fires.
///
/// The returned handle resolves once the loop has stopped and every in-flight
/// job has finished.
pub fn spawn_job_worker_pool(
    context: JobWorkerContext,
    settings: WorkerPoolSettings,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    let concurrency = settings.max_concurrent_jobs.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let in_flight = TaskTracker::new();

    tokio::spawn(async move {
        info!("Job worker pool started with concurrency: {}", concurrency);

        loop {
            // Wait for a permit before polling for a task
            let permit = tokio::select! {
                _ = shutdown_token.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(err) => {
                        error!(error = %err, "Failed to acquire concurrency permit for job processing");
                        break;
                    }
                },
            };

            // Not raced against shutdown: a popped task must not be dropped
            let task = match context.queue.dequeue(settings.poll_timeout).await {
                Ok(task) => task,
                Err(e) => {
                    error!("Failed to poll task queue: {}", e);
                    drop(permit);
                    tokio::select! {
                        _ = shutdown_token.cancelled() => break,
                        _ = tokio::time::sleep(QUEUE_ERROR_BACKOFF) => continue,
                    }
                }
            };

            if let Some(task) = task {
                let ctx = context.clone();
                in_flight.spawn(async move {
                    process_task(ctx, task).await;
                    drop(permit);
                });
            }

            if shutdown_token.is_cancelled() {
                break;
            }
        }

        in_flight.close();
        info!(in_flight = in_flight.len(), "Job worker pool draining");
        in_flight.wait().await;
        info!("Job worker pool stopped");
    })
}

async fn process_task(ctx: JobWorkerContext, task: QueuedTask) {
    let job_id = task.job_id;

    info!(job_id = %job_id, "Processing analysis task");

    report(
        &ctx,
        &job_id,
        NativeTaskState::Started,
        json!({"message": SUMMARY_STARTED}),
    )
    .await;

    let reporter = QueueProgressReporter::new(ctx.queue.clone());
    match ctx
        .executor
        .execute(&job_id, &task.project_path, &reporter)
        .await
    {
        Ok(_) => {
            report(
                &ctx,
                &job_id,
                NativeTaskState::Success,
                json!({"progress": 100, "message": SUMMARY_COMPLETED}),
            )
            .await;
            info!(job_id = %job_id, "Analysis task finished successfully");
        }
        Err(err) => {
            let text = err.to_string();
            report(
                &ctx,
                &job_id,
                NativeTaskState::Failure,
                json!({
                    "progress": reporter.last_progress(),
                    "message": text,
                    "detail": text,
                }),
            )
            .await;
            warn!(job_id = %job_id, error = %err, "Analysis task failed");
        }
    }
}

async fn report(
    ctx: &JobWorkerContext,
    job_id: &JobId,
    state: NativeTaskState,
    info: serde_json::Value,
) {
    if let Err(e) = ctx.queue.report_state(job_id, state.clone(), info).await {
        error!(job_id = %job_id, state = %state, error = %e, "Failed to record task state");
    }
}
