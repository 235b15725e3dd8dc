//! Analysis orchestrator
//!
//! Resolves a project directory, picks the first analyzer plugin that claims
//! it, runs the plugin and normalizes the payload into the canonical model.
//! Plugin calls are blocking and run on tokio's blocking pool.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use nexus_core::domain::plugin::PluginError;
use nexus_core::domain::udm::{SchemaValidationError, UnifiedDataModel};

use crate::application::canonical_model::{CanonicalModelBuilder, CanonicalModelError};
use crate::infrastructure::plugin_registry::{PluginRegistry, panic_message};

/// Source of the seeded `analysisTimestamp`
pub type Clock = fn() -> DateTime<Utc>;

/// Errors from a single orchestrated analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Project path {0} does not exist")]
    PathNotFound(PathBuf),

    #[error("Project path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("No analyzer plugin supports {0}")]
    NoApplicablePlugin(PathBuf),

    #[error("Plugin {plugin} returned invalid output: {message}")]
    InvalidPluginOutput { plugin: String, message: String },

    #[error("Plugin {plugin} produced a payload that failed validation: {source}")]
    SchemaValidation {
        plugin: String,
        #[source]
        source: SchemaValidationError,
    },

    #[error("Plugin {plugin} failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Errors caused by the caller's input or an unsupported project
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_) | Self::NotADirectory(_) | Self::NoApplicablePlugin(_)
        )
    }
}

/// Coordinates analyzer discovery and execution
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    registry: Arc<PluginRegistry>,
    clock: Clock,
}

impl AnalysisOrchestrator {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock, mainly for deterministic tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Analyze the project at `project_path` with the first applicable plugin
    pub async fn analyze(
        &self,
        project_path: impl AsRef<Path>,
    ) -> Result<UnifiedDataModel, AnalysisError> {
        let requested = project_path.as_ref().to_path_buf();
        let registry = self.registry.clone();
        let clock = self.clock;

        let task_path = requested.clone();
        let result = match tokio::task::spawn_blocking(move || {
            run_analysis(&registry, &task_path, clock)
        })
        .await
        {
            Ok(result) => result,
            Err(join_err) => Err(AnalysisError::Internal(if join_err.is_panic() {
                panic_message(join_err.into_panic().as_ref())
            } else {
                join_err.to_string()
            })),
        };

        if let Err(err) = &result {
            if err.is_input_error() {
                warn!(path = %requested.display(), error = %err, "Analysis rejected");
            } else {
                error!(path = %requested.display(), error = %err, "Analysis failed");
            }
        }

        result
    }
}

fn run_analysis(
    registry: &PluginRegistry,
    requested: &Path,
    clock: Clock,
) -> Result<UnifiedDataModel, AnalysisError> {
    let project_dir = resolve_project_dir(requested)?;

    let applicable = registry.find_applicable(&project_dir);
    // Only the first applicable plugin runs
    let Some(plugin) = applicable.first() else {
        return Err(AnalysisError::NoApplicablePlugin(project_dir));
    };
    let plugin_name = plugin.name().to_string();

    info!(plugin = %plugin_name, path = %project_dir.display(), "Running analyzer plugin");

    let raw = match panic::catch_unwind(AssertUnwindSafe(|| plugin.analyze(&project_dir))) {
        Ok(Ok(raw)) => raw,
        Ok(Err(source)) => {
            return Err(AnalysisError::Plugin {
                plugin: plugin_name,
                source,
            });
        }
        Err(payload) => {
            return Err(AnalysisError::Internal(format!(
                "Plugin {} panicked: {}",
                plugin_name,
                panic_message(payload.as_ref())
            )));
        }
    };

    let udm = CanonicalModelBuilder::build(raw, &project_dir, &plugin_name, clock()).map_err(
        |e| match e {
            CanonicalModelError::NotAnObject(_) => AnalysisError::InvalidPluginOutput {
                plugin: plugin_name.clone(),
                message: e.to_string(),
            },
            CanonicalModelError::Schema(source) => AnalysisError::SchemaValidation {
                plugin: plugin_name.clone(),
                source,
            },
        },
    )?;

    debug!(
        plugin = %plugin_name,
        code_units = udm.code_units.len(),
        dependencies = udm.dependencies.len(),
        "Analyzer payload normalized"
    );

    Ok(udm)
}

/// Expand a leading `~` and resolve the path to an existing directory
pub fn resolve_project_dir(requested: &Path) -> Result<PathBuf, AnalysisError> {
    let expanded = expand_home(requested);

    let resolved = match std::fs::canonicalize(&expanded) {
        Ok(path) => path,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Err(AnalysisError::PathNotFound(requested.to_path_buf()));
        }
        Err(e) => return Err(AnalysisError::Io(e)),
    };

    if !resolved.is_dir() {
        return Err(AnalysisError::NotADirectory(requested.to_path_buf()));
    }

    Ok(resolved)
}

/// Replace a leading `~` component with the current user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        let plain = PathBuf::from("/srv/project");
        assert_eq!(expand_home(&plain), plain);

        let nested = PathBuf::from("/srv/~/project");
        assert_eq!(expand_home(&nested), nested);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/code")), home.join("code"));
        }
    }

    #[test]
    fn resolve_rejects_files_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.py");
        std::fs::write(&file, "print('hi')\n").unwrap();

        assert!(matches!(
            resolve_project_dir(&file),
            Err(AnalysisError::NotADirectory(_))
        ));
        assert!(matches!(
            resolve_project_dir(&dir.path().join("missing")),
            Err(AnalysisError::PathNotFound(_))
        ));
        assert!(matches!(
            resolve_project_dir(&file.join("below-a-file")),
            Err(AnalysisError::PathNotFound(_))
        ));
        assert!(resolve_project_dir(dir.path()).unwrap().is_absolute());
    }
}
