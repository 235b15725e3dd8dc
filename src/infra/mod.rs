//! Infrastructure initialization for the Nexus application
//!
//! Builds the report store and, in distributed mode, the task queue
//! connection from configuration.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use nexus_core::Config;
use nexus_core::config::ExecutionMode;
use nexus_orchestrator::domain::{ReportStore, TaskQueue};
use nexus_orchestrator::infrastructure::{
    InMemoryReportStore, PostgresReportStore, RedisTaskQueue,
};

use crate::app::AppError;

/// Infrastructure components initialized at startup
pub struct Infrastructure {
    pub report_store: Arc<dyn ReportStore>,
    pub task_queue: Option<Arc<dyn TaskQueue>>,
    pub db_pool: Option<Arc<PgPool>>,
}

impl Infrastructure {
    /// Initialize all infrastructure components from configuration
    pub async fn init(config: &Config) -> Result<Self, AppError> {
        let (report_store, db_pool): (Arc<dyn ReportStore>, _) = if config.database.is_in_memory() {
            info!("Using in-memory report store");
            (Arc::new(InMemoryReportStore::new()), None)
        } else {
            info!("Initializing PostgreSQL database pool");
            let pool = Arc::new(
                PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .acquire_timeout(Duration::from_secs(
                        config.database.connect_timeout_seconds,
                    ))
                    .connect(&config.database.url)
                    .await?,
            );

            if config.database.run_migrations {
                info!("Applying report store migrations");
                sqlx::migrate!("./migrations").run(&*pool).await?;
            }

            (
                Arc::new(PostgresReportStore::new(pool.clone())),
                Some(pool),
            )
        };

        let task_queue: Option<Arc<dyn TaskQueue>> = match config.execution.mode {
            ExecutionMode::Distributed => {
                info!(url = %config.queue.url, "Connecting to task queue");
                Some(Arc::new(RedisTaskQueue::connect(&config.queue).await?))
            }
            ExecutionMode::Inline => None,
        };

        Ok(Self {
            report_store,
            task_queue,
            db_pool,
        })
    }

    /// In-process backends only; used when no external services are wanted
    pub fn in_memory(task_queue: Option<Arc<dyn TaskQueue>>) -> Self {
        Self {
            report_store: Arc::new(InMemoryReportStore::new()),
            task_queue,
            db_pool: None,
        }
    }
}
