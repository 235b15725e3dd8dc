//! Task queue backends and the queue-backed progress channel

mod memory;
mod redis_queue;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::domain::services::{ProgressReporter, TaskQueue};
use crate::domain::value_objects::{JobId, NativeTaskState};

pub use memory::InMemoryTaskQueue;
pub use redis_queue::RedisTaskQueue;

/// Publishes checkpoints as `PROGRESS` states in the queue's result store
pub struct QueueProgressReporter {
    queue: Arc<dyn TaskQueue>,
    last_progress: AtomicU8,
}

impl QueueProgressReporter {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            queue,
            last_progress: AtomicU8::new(0),
        }
    }

    /// Progress of the most recent checkpoint
    pub fn last_progress(&self) -> u8 {
        self.last_progress.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProgressReporter for QueueProgressReporter {
    async fn checkpoint(&self, job_id: &JobId, progress: u8, message: &str) {
        let progress = progress.min(100);
        self.last_progress.store(progress, Ordering::Relaxed);

        if let Err(e) = self
            .queue
            .report_state(
                job_id,
                NativeTaskState::Progress,
                json!({"progress": progress, "message": message}),
            )
            .await
        {
            warn!(job_id = %job_id, error = %e, "Failed to publish progress checkpoint");
        }
    }
}
