use std::time::Duration;

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use tracing::{debug, error};

use nexus_core::config::QueueConfig;

use crate::domain::entities::{QueuedTask, TaskSnapshot};
use crate::domain::services::{TaskQueue, TaskQueueError};
use crate::domain::value_objects::{JobId, NativeTaskState};

/// Redis/Dragonfly-backed task queue
///
/// Keys:
/// - `{prefix}:queue` list of serialized [`QueuedTask`]s (LPUSH / BRPOP)
/// - `{prefix}:task:{id}` serialized [`TaskSnapshot`], expiring after the result TTL
pub struct RedisTaskQueue {
    connection: ConnectionManager,
    /// Dedicated to BRPOP
    blocking_connection: ConnectionManager,
    key_prefix: String,
    result_ttl: Duration,
}

impl RedisTaskQueue {
    /// Connect to the queue backend and verify it answers PING
    pub async fn connect(config: &QueueConfig) -> Result<Self, TaskQueueError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            TaskQueueError::Backend(format!("Invalid queue URL: {}", e))
        })?;

        let connection = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| backend_error("connect", e))?;
        let blocking_connection = ConnectionManager::new(client)
            .await
            .map_err(|e| backend_error("connect", e))?;

        let mut conn = connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| backend_error("PING", e))?;

        debug!("Connected to task queue backend at {}", config.url);

        Ok(Self {
            connection,
            blocking_connection,
            key_prefix: config.key_prefix.clone(),
            result_ttl: config.result_ttl(),
        })
    }

    fn queue_key(&self) -> String {
        format!("{}:queue", self.key_prefix)
    }

    fn task_key(&self, job_id: &JobId) -> String {
        format!("{}:task:{}", self.key_prefix, job_id)
    }
}

fn backend_error(command: &str, e: redis::RedisError) -> TaskQueueError {
    error!("Redis {} error: {}", command, e);
    TaskQueueError::Backend(format!("Redis {} error: {}", command, e))
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    fn next_task_id(&self) -> JobId {
        JobId::generate()
    }

    async fn enqueue(&self, task: QueuedTask) -> Result<(), TaskQueueError> {
        self.report_state(&task.job_id, NativeTaskState::Pending, serde_json::json!({}))
            .await?;

        let payload = serde_json::to_string(&task)?;
        let mut conn = self.connection.clone();
        redis::cmd("LPUSH")
            .arg(self.queue_key())
            .arg(payload)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| {
                error!(job_id = %task.job_id, "Failed to LPUSH task: {}", e);
                TaskQueueError::EnqueueFailed(e.to_string())
            })?;

        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<QueuedTask>, TaskQueueError> {
        let mut conn = self.blocking_connection.clone();

        // BRPOP returns [key, value] or nil on timeout
        let popped = redis::cmd("BRPOP")
            .arg(self.queue_key())
            .arg(timeout.as_secs_f64())
            .query_async::<Option<(String, String)>>(&mut conn)
            .await
            .map_err(|e| backend_error("BRPOP", e))?;

        match popped {
            Some((_, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn report_state(
        &self,
        job_id: &JobId,
        state: NativeTaskState,
        info: serde_json::Value,
    ) -> Result<(), TaskQueueError> {
        let payload = serde_json::to_string(&TaskSnapshot::new(state, info))?;
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(self.task_key(job_id))
            .arg(payload)
            .arg("EX")
            .arg(self.result_ttl.as_secs().max(1))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| backend_error("SET", e))
    }

    async fn get_state(&self, job_id: &JobId) -> Result<Option<TaskSnapshot>, TaskQueueError> {
        let mut conn = self.connection.clone();
        let payload = redis::cmd("GET")
            .arg(self.task_key(job_id))
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|e| backend_error("GET", e))?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}
