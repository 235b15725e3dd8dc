//! Background workers for the Nexus application

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use nexus_core::Config;
use nexus_orchestrator::application::JobExecutor;
use nexus_orchestrator::domain::TaskQueue;
use nexus_orchestrator::infrastructure::{
    JobWorkerContext, WorkerPoolSettings, spawn_job_worker_pool,
};

/// Spawn the pool that drains the task queue until `shutdown_token` fires
pub fn spawn_analysis_workers(
    executor: Arc<JobExecutor>,
    queue: Arc<dyn TaskQueue>,
    config: &Config,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    let settings = WorkerPoolSettings {
        max_concurrent_jobs: config.execution.max_concurrent_jobs,
        poll_timeout: config.execution.poll_timeout(),
    };

    info!(
        max_concurrent_jobs = settings.max_concurrent_jobs,
        poll_timeout_seconds = config.execution.poll_timeout_seconds,
        "Starting analysis worker pool"
    );

    spawn_job_worker_pool(JobWorkerContext { executor, queue }, settings, shutdown_token)
}
