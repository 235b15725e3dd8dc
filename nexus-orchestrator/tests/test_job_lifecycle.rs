//! Integration tests for job lifecycle across both execution backends

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use common::*;
use nexus_orchestrator::application::{
    DispatchError, ExecutionBackend, JobDispatcher, ProgressTracker,
};
use nexus_orchestrator::domain::{JobId, JobStatus, NativeTaskState, ReportStore, TaskQueue};
use nexus_orchestrator::infrastructure::{
    InMemoryTaskQueue, JobWorkerContext, QueueProgressReporter, WorkerPoolSettings,
    spawn_job_worker_pool,
};

struct DistributedRig {
    harness: Harness,
    queue: Arc<InMemoryTaskQueue>,
    dispatcher: JobDispatcher,
    shutdown: CancellationToken,
    workers: tokio::task::JoinHandle<()>,
}

impl DistributedRig {
    fn start(harness: Harness) -> Self {
        let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_secs(60)));
        let dispatcher =
            harness.dispatcher(ExecutionBackend::distributed(queue.clone() as Arc<dyn TaskQueue>));
        let shutdown = CancellationToken::new();
        let workers = spawn_job_worker_pool(
            JobWorkerContext {
                executor: harness.executor.clone(),
                queue: queue.clone(),
            },
            WorkerPoolSettings {
                max_concurrent_jobs: 2,
                poll_timeout: Duration::from_millis(50),
            },
            shutdown.clone(),
        );

        Self {
            harness,
            queue,
            dispatcher,
            shutdown,
            workers,
        }
    }

    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.workers)
            .await
            .expect("worker pool should stop")
            .expect("worker pool should not panic");
    }
}

// ── Inline mode ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inline_job_completes() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let tracker = TaskTracker::new();
    let dispatcher = harness.dispatcher(ExecutionBackend::inline(tracker.clone()));

    let job_id = dispatcher.submit(&project, None).await.unwrap();
    assert_eq!(job_id.as_str().len(), 32);

    tracker.close();
    tracker.wait().await;

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.progress, 100);
    assert_eq!(view.message.as_deref(), Some("Analysis completed"));
    assert!(view.error.is_none());

    let udm = dispatcher.report(&job_id).await.unwrap();
    assert_eq!(udm.project_name, "demo");
    assert_eq!(udm.languages, vec!["Python".to_string()]);
}

#[tokio::test]
async fn test_inline_job_failure_is_reported_not_raised() {
    let (_root, project) = project_with("notes", &[("README.md", "# notes\n")]);
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let tracker = TaskTracker::new();
    let dispatcher = harness.dispatcher(ExecutionBackend::inline(tracker.clone()));

    // Submission succeeds even though the analysis will fail
    let job_id = dispatcher.submit(&project, None).await.unwrap();
    tracker.close();
    tracker.wait().await;

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.progress, 10);
    let error = view.error.expect("failed view carries an error");
    assert!(error.starts_with("No analyzer plugin supports"));

    match dispatcher.report(&job_id).await {
        Err(DispatchError::JobFailed(detail)) => assert_eq!(detail, error),
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_inline_bad_path_becomes_failed_job() {
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let tracker = TaskTracker::new();
    let dispatcher = harness.dispatcher(ExecutionBackend::inline(tracker.clone()));

    let job_id = dispatcher
        .submit("/definitely/not/a/real/project", None)
        .await
        .unwrap();
    tracker.close();
    tracker.wait().await;

    let record = harness.store.get(&job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.summary.unwrap().contains("does not exist"));
    assert!(record.completed_at.is_some());
}

#[tokio::test]
async fn test_inline_checkpoints_are_dropped_after_jobs_finish() {
    let (_root, project) = python_project();
    let (_notes_root, notes) = project_with("notes", &[("README.md", "# notes\n")]);
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let tracker = TaskTracker::new();
    let progress = Arc::new(ProgressTracker::new());
    let dispatcher = harness.dispatcher(ExecutionBackend::Inline {
        tracker: tracker.clone(),
        progress: progress.clone(),
    });

    let mut jobs = Vec::new();
    for i in 0..20 {
        let path = if i % 2 == 0 { &project } else { &notes };
        jobs.push(dispatcher.submit(path, None).await.unwrap());
    }
    tracker.close();
    tracker.wait().await;

    assert!(progress.is_empty().await);

    // Terminal views keep their progress without the in-process checkpoint
    for (i, job_id) in jobs.iter().enumerate() {
        let view = dispatcher.status(job_id).await.unwrap();
        if i % 2 == 0 {
            assert_eq!((view.status, view.progress), (JobStatus::Completed, 100));
        } else {
            assert_eq!((view.status, view.progress), (JobStatus::Failed, 10));
        }
    }
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let dispatcher = harness.dispatcher(ExecutionBackend::inline(TaskTracker::new()));

    let missing = JobId::from("does-not-exist");
    assert!(matches!(
        dispatcher.status(&missing).await,
        Err(DispatchError::NotFound(_))
    ));
    assert!(matches!(
        dispatcher.report(&missing).await,
        Err(DispatchError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_reports_newest_first() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let tracker = TaskTracker::new();
    let dispatcher = harness.dispatcher(ExecutionBackend::inline(tracker.clone()));
    let owner = Uuid::new_v4();

    let first = dispatcher.submit(&project, Some(owner)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = dispatcher.submit(&project, Some(owner)).await.unwrap();
    dispatcher.submit(&project, None).await.unwrap();
    tracker.close();
    tracker.wait().await;

    let reports = dispatcher.list_reports(owner).await.unwrap();
    let ids: Vec<JobId> = reports.into_iter().map(|r| r.job_id).collect();
    assert_eq!(ids, vec![second, first]);
}

// ── Distributed mode ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_distributed_job_completes() {
    let (_root, project) = python_project();
    let rig = DistributedRig::start(Harness::new(registry_of(vec![python_plugin()])));

    let job_id = rig.dispatcher.submit(&project, None).await.unwrap();
    let view = wait_for_terminal(&rig.dispatcher, &job_id).await;

    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.progress, 100);

    let udm = rig.dispatcher.report(&job_id).await.unwrap();
    assert_eq!(udm.project_name, "demo");

    let native = rig.queue.get_state(&job_id).await.unwrap().unwrap();
    assert_eq!(native.state, NativeTaskState::Success);

    rig.stop().await;
}

#[tokio::test]
async fn test_distributed_failure_carries_progress_and_detail() {
    let (_root, project) = python_project();
    let rig = DistributedRig::start(Harness::new(registry_of(vec![Arc::new(
        FailingPlugin { panics: false },
    )])));

    let job_id = rig.dispatcher.submit(&project, None).await.unwrap();
    let view = wait_for_terminal(&rig.dispatcher, &job_id).await;

    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.progress, 10);
    let error = view.error.unwrap();
    assert!(error.contains("parser exploded"));

    let record = rig.harness.store.get(&job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.summary.as_deref(), Some(error.as_str()));

    rig.stop().await;
}

#[tokio::test]
async fn test_both_modes_produce_identical_payloads() {
    let (_root, project) = python_project();

    let inline_harness = Harness::new(registry_of(vec![python_plugin()]));
    let tracker = TaskTracker::new();
    let inline = inline_harness.dispatcher(ExecutionBackend::inline(tracker.clone()));
    let inline_id = inline.submit(&project, None).await.unwrap();
    tracker.close();
    tracker.wait().await;
    let inline_udm = inline.report(&inline_id).await.unwrap();

    let rig = DistributedRig::start(Harness::new(registry_of(vec![python_plugin()])));
    let queued_id = rig.dispatcher.submit(&project, None).await.unwrap();
    wait_for_terminal(&rig.dispatcher, &queued_id).await;
    let queued_udm = rig.dispatcher.report(&queued_id).await.unwrap();

    assert_eq!(inline_udm, queued_udm);
    rig.stop().await;
}

#[tokio::test]
async fn test_status_falls_back_to_store_when_result_expired() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    // Results expire immediately, so only the report store remembers the outcome
    let queue = Arc::new(InMemoryTaskQueue::new(Duration::ZERO));
    let dispatcher =
        harness.dispatcher(ExecutionBackend::distributed(queue.clone() as Arc<dyn TaskQueue>));

    let job_id = dispatcher.submit(&project, None).await.unwrap();
    let task = queue
        .dequeue(Duration::from_millis(50))
        .await
        .unwrap()
        .expect("task was enqueued");
    assert_eq!(task.job_id, job_id);

    let progress = nexus_orchestrator::application::ProgressTracker::new();
    harness
        .executor
        .execute(&task.job_id, &task.project_path, &progress)
        .await
        .unwrap();

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert!(dispatcher.report(&job_id).await.is_ok());
}

#[tokio::test]
async fn test_completed_record_outranks_stale_progress_in_queue() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_secs(60)));
    let dispatcher =
        harness.dispatcher(ExecutionBackend::distributed(queue.clone() as Arc<dyn TaskQueue>));

    let job_id = dispatcher.submit(&project, None).await.unwrap();
    let task = queue
        .dequeue(Duration::from_millis(50))
        .await
        .unwrap()
        .expect("task was enqueued");

    // The worker finishes the record but never writes SUCCESS to the queue
    let reporter = QueueProgressReporter::new(queue.clone());
    harness
        .executor
        .execute(&task.job_id, &task.project_path, &reporter)
        .await
        .unwrap();
    let native = queue.get_state(&job_id).await.unwrap().unwrap();
    assert_eq!(native.state, NativeTaskState::Progress);

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.progress, 100);
    assert!(dispatcher.report(&job_id).await.is_ok());
}

#[tokio::test]
async fn test_expired_failure_keeps_checkpoint_progress() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![Arc::new(FailingPlugin { panics: false })]));
    let queue = Arc::new(InMemoryTaskQueue::new(Duration::ZERO));
    let dispatcher =
        harness.dispatcher(ExecutionBackend::distributed(queue.clone() as Arc<dyn TaskQueue>));

    let job_id = dispatcher.submit(&project, None).await.unwrap();
    let task = queue
        .dequeue(Duration::from_millis(50))
        .await
        .unwrap()
        .expect("task was enqueued");

    let reporter = QueueProgressReporter::new(queue.clone());
    harness
        .executor
        .execute(&task.job_id, &task.project_path, &reporter)
        .await
        .unwrap_err();
    assert!(queue.get_state(&job_id).await.unwrap().is_none());

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.progress, reporter.last_progress());
    assert_eq!(view.progress, 10);
    assert!(view.error.unwrap().contains("parser exploded"));
}

#[tokio::test]
async fn test_queued_job_is_pending_until_a_worker_runs() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_secs(60)));
    let dispatcher =
        harness.dispatcher(ExecutionBackend::distributed(queue.clone() as Arc<dyn TaskQueue>));

    let job_id = dispatcher.submit(&project, None).await.unwrap();

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Pending);
    assert_eq!(view.progress, 0);
    assert_eq!(view.message.as_deref(), Some("Queued for analysis"));

    assert!(matches!(
        dispatcher.report(&job_id).await,
        Err(DispatchError::NotReady(_))
    ));
}

#[tokio::test]
async fn test_queue_failure_without_record_update_is_reported() {
    let (_root, project) = python_project();
    let harness = Harness::new(registry_of(vec![python_plugin()]));
    let queue = Arc::new(InMemoryTaskQueue::new(Duration::from_secs(60)));
    let dispatcher =
        harness.dispatcher(ExecutionBackend::distributed(queue.clone() as Arc<dyn TaskQueue>));

    let job_id = dispatcher.submit(&project, None).await.unwrap();
    // A worker died after marking the task failed but before touching the record
    queue
        .report_state(
            &job_id,
            NativeTaskState::Failure,
            json!({"progress": 40, "message": "boom"}),
        )
        .await
        .unwrap();

    let view = dispatcher.status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.progress, 40);
    assert_eq!(view.error.as_deref(), Some("boom"));

    match dispatcher.report(&job_id).await {
        Err(DispatchError::JobFailed(detail)) => assert_eq!(detail, "boom"),
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_worker_pool_stops_on_cancellation() {
    let rig = DistributedRig::start(Harness::new(registry_of(vec![python_plugin()])));
    assert!(rig.queue.is_empty().await);
    rig.stop().await;
}
