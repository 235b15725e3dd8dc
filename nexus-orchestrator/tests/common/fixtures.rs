//! Project directories and service wiring for tests

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use nexus_core::domain::plugin::AnalyzerPlugin;
use nexus_orchestrator::application::{
    AnalysisOrchestrator, JobDispatcher, JobExecutor, JobWorkflow,
};
use nexus_orchestrator::application::dispatch::ExecutionBackend;
use nexus_orchestrator::domain::{JobId, JobStatus, ReportStore, StatusView};
use nexus_orchestrator::infrastructure::{InMemoryReportStore, PluginRegistry};

/// Temporary project directory containing `files`
pub fn project_with(dir_name: &str, files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let root = tempfile::tempdir().expect("tempdir");
    let project = root.path().join(dir_name);
    std::fs::create_dir_all(&project).expect("create project dir");
    for (name, contents) in files {
        std::fs::write(project.join(name), contents).expect("write project file");
    }
    (root, project)
}

pub fn python_project() -> (TempDir, PathBuf) {
    project_with("demo", &[("main.py", "def main():\n    return 1\n")])
}

pub fn fixed_clock() -> DateTime<Utc> {
    "2024-05-01T10:00:00Z".parse().expect("valid timestamp")
}

pub fn registry_of(plugins: Vec<Arc<dyn AnalyzerPlugin>>) -> Arc<PluginRegistry> {
    let mut registry = PluginRegistry::new();
    for plugin in plugins {
        registry.register(plugin);
    }
    Arc::new(registry)
}

/// Store, workflow and executor wired around `registry`
pub struct Harness {
    pub store: Arc<InMemoryReportStore>,
    pub workflow: Arc<JobWorkflow>,
    pub executor: Arc<JobExecutor>,
}

impl Harness {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        let store = Arc::new(InMemoryReportStore::new());
        let workflow = Arc::new(JobWorkflow::new(store.clone() as Arc<dyn ReportStore>));
        let orchestrator =
            Arc::new(AnalysisOrchestrator::new(registry).with_clock(fixed_clock));
        let executor = Arc::new(JobExecutor::new(orchestrator, workflow.clone()));
        Self {
            store,
            workflow,
            executor,
        }
    }

    pub fn dispatcher(&self, backend: ExecutionBackend) -> JobDispatcher {
        JobDispatcher::new(backend, self.workflow.clone(), self.executor.clone())
    }
}

/// Poll `status` until the job reaches a terminal state
pub async fn wait_for_terminal(dispatcher: &JobDispatcher, job_id: &JobId) -> StatusView {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let view = dispatcher.status(job_id).await.expect("status");
        if matches!(view.status, JobStatus::Completed | JobStatus::Failed) {
            return view;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} did not finish, last status: {view:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
