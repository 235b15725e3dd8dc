//! Application setup and wiring

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use nexus_core::Config;
use nexus_core::config::ExecutionMode;
use nexus_core::domain::plugin::PluginFactory;
use nexus_orchestrator::application::{
    AnalysisOrchestrator, ExecutionBackend, JobDispatcher, JobExecutor, JobWorkflow,
};
use nexus_orchestrator::domain::{ReportStore, TaskQueue, TaskQueueError};
use nexus_orchestrator::infrastructure::PluginRegistry;

use crate::infra::Infrastructure;
use crate::workers::spawn_analysis_workers;

/// Analyzer plugins compiled into this binary.
///
/// Language analyzers live in their own crates and are linked in by listing
/// their factories here.
pub const BUILTIN_PLUGINS: &[PluginFactory] = &[];

/// Startup and runtime errors of the bootstrap layer
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Task queue error: {0}")]
    Queue(#[from] TaskQueueError),

    #[error("Execution mode '{0}' does not run a worker pool")]
    NoWorkerPool(ExecutionMode),
}

/// Fully wired services plus the handles needed for graceful shutdown
pub struct AppContext {
    pub config: Arc<Config>,
    pub registry: Arc<PluginRegistry>,
    pub report_store: Arc<dyn ReportStore>,
    pub workflow: Arc<JobWorkflow>,
    pub executor: Arc<JobExecutor>,
    pub dispatcher: JobDispatcher,
    pub shutdown_token: CancellationToken,
    task_queue: Option<Arc<dyn TaskQueue>>,
    inline_tasks: TaskTracker,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl AppContext {
    /// Connect to the configured backends and wire every service
    pub async fn init(config: Config, factories: &[PluginFactory]) -> Result<Self, AppError> {
        let infrastructure = Infrastructure::init(&config).await?;
        Self::with_infrastructure(config, factories, infrastructure)
    }

    /// Wire services around already-initialized infrastructure
    pub fn with_infrastructure(
        config: Config,
        factories: &[PluginFactory],
        infrastructure: Infrastructure,
    ) -> Result<Self, AppError> {
        let registry = Arc::new(PluginRegistry::load(factories, &config.plugins.disabled));
        if registry.is_empty() {
            warn!("No analyzer plugins loaded; every analysis will fail");
        }

        let workflow = Arc::new(JobWorkflow::new(infrastructure.report_store.clone()));
        let orchestrator = Arc::new(AnalysisOrchestrator::new(registry.clone()));
        let executor = Arc::new(JobExecutor::new(orchestrator, workflow.clone()));

        let inline_tasks = TaskTracker::new();
        let backend = match (config.execution.mode, &infrastructure.task_queue) {
            (ExecutionMode::Distributed, Some(queue)) => ExecutionBackend::distributed(queue.clone()),
            (ExecutionMode::Distributed, None) => {
                return Err(AppError::Queue(TaskQueueError::Backend(
                    "distributed mode requires a task queue".to_string(),
                )));
            }
            (ExecutionMode::Inline, _) => ExecutionBackend::inline(inline_tasks.clone()),
        };
        info!(backend = backend.name(), "Job dispatcher ready");

        let dispatcher = JobDispatcher::new(backend, workflow.clone(), executor.clone());

        Ok(Self {
            config: Arc::new(config),
            registry,
            report_store: infrastructure.report_store,
            workflow,
            executor,
            dispatcher,
            shutdown_token: CancellationToken::new(),
            task_queue: infrastructure.task_queue,
            inline_tasks,
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Start the queue-consuming worker pool (distributed mode only)
    pub async fn start_workers(&self) -> Result<(), AppError> {
        let Some(queue) = self.task_queue.clone() else {
            return Err(AppError::NoWorkerPool(self.config.execution.mode));
        };

        let handle = spawn_analysis_workers(
            self.executor.clone(),
            queue,
            &self.config,
            self.shutdown_token.clone(),
        );
        self.workers.lock().await.push(handle);
        Ok(())
    }

    /// Stop accepting work and wait for in-flight jobs, bounded by the
    /// configured shutdown timeout
    pub async fn shutdown(&self) {
        info!("Cancelling background tasks...");
        self.shutdown_token.cancel();
        self.inline_tasks.close();

        let workers: Vec<_> = self.workers.lock().await.drain(..).collect();
        let drain = async {
            for worker in workers {
                if let Err(e) = worker.await {
                    warn!(error = %e, "Worker pool task ended abnormally");
                }
            }
            self.inline_tasks.wait().await;
        };

        let timeout = self.config.execution.shutdown_timeout();
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(
                timeout_seconds = timeout.as_secs(),
                "Background tasks shutdown timeout reached"
            );
        } else {
            info!("Background tasks stopped");
        }
    }
}
