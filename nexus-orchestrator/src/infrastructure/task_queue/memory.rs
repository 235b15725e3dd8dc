use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;

use crate::domain::entities::{QueuedTask, TaskSnapshot};
use crate::domain::services::{TaskQueue, TaskQueueError};
use crate::domain::value_objects::{JobId, NativeTaskState};

/// Process-local task queue with an expiring result store
///
/// Lets the distributed code path run without a broker, which is what the
/// integration tests do.
#[derive(Debug)]
pub struct InMemoryTaskQueue {
    pending: Mutex<VecDeque<QueuedTask>>,
    available: Notify,
    results: RwLock<HashMap<JobId, (TaskSnapshot, Instant)>>,
    result_ttl: Duration,
}

impl InMemoryTaskQueue {
    pub fn new(result_ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            results: RwLock::new(HashMap::new()),
            result_ttl,
        }
    }

    /// Number of tasks waiting for a worker
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    fn next_task_id(&self) -> JobId {
        JobId::generate()
    }

    async fn enqueue(&self, task: QueuedTask) -> Result<(), TaskQueueError> {
        self.report_state(&task.job_id, NativeTaskState::Pending, serde_json::json!({}))
            .await?;
        self.pending.lock().await.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<QueuedTask>, TaskQueueError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(task) = self.pending.lock().await.pop_front() {
                return Ok(Some(task));
            }

            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn report_state(
        &self,
        job_id: &JobId,
        state: NativeTaskState,
        info: serde_json::Value,
    ) -> Result<(), TaskQueueError> {
        self.results.write().await.insert(
            job_id.clone(),
            (TaskSnapshot::new(state, info), Instant::now() + self.result_ttl),
        );
        Ok(())
    }

    async fn get_state(&self, job_id: &JobId) -> Result<Option<TaskSnapshot>, TaskQueueError> {
        let mut results = self.results.write().await;
        match results.get(job_id) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                results.remove(job_id);
                Ok(None)
            }
            Some((snapshot, _)) => Ok(Some(snapshot.clone())),
            None => Ok(None),
        }
    }
}
