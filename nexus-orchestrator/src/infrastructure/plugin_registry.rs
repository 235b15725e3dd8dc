//! Plugin registry for managing analyzer plugins

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use nexus_core::domain::plugin::{AnalyzerPlugin, PluginFactory};

/// Registry for analyzer plugins
///
/// Plugins are kept in registration order and deduplicated by name. Once the
/// registry is wrapped in an `Arc` and shared it is effectively immutable.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn AnalyzerPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the compiled-in factory table.
    ///
    /// A factory whose id is listed in `disabled`, or which returns an error
    /// or panics, is skipped with a warning.
    pub fn load(factories: &[PluginFactory], disabled: &[String]) -> Self {
        let mut registry = Self::new();

        for factory in factories {
            if disabled.iter().any(|id| id == factory.id) {
                info!(factory = factory.id, "Analyzer plugin disabled by configuration");
                continue;
            }

            match panic::catch_unwind(factory.build) {
                Ok(Ok(plugin)) => {
                    registry.register(plugin);
                }
                Ok(Err(e)) => {
                    warn!(factory = factory.id, error = %e, "Failed to load analyzer plugin");
                }
                Err(payload) => {
                    warn!(
                        factory = factory.id,
                        panic = %panic_message(payload.as_ref()),
                        "Analyzer plugin factory panicked"
                    );
                }
            }
        }

        info!(
            plugins = ?registry.names(),
            "Loaded {} analyzer plugin(s)",
            registry.len()
        );
        registry
    }

    /// Register a plugin; returns false if one with the same name exists
    pub fn register(&mut self, plugin: Arc<dyn AnalyzerPlugin>) -> bool {
        if self.get(plugin.name()).is_some() {
            debug!(plugin = plugin.name(), "Analyzer plugin already registered");
            return false;
        }

        debug!(plugin = plugin.name(), "Registered analyzer plugin");
        self.plugins.push(plugin);
        true
    }

    /// Plugins whose `discover` claims `path`, in registration order.
    ///
    /// A plugin that errors or panics during discovery is logged and left out;
    /// the query itself never fails.
    pub fn find_applicable(&self, path: &Path) -> Vec<Arc<dyn AnalyzerPlugin>> {
        let mut applicable = Vec::new();

        for plugin in &self.plugins {
            match panic::catch_unwind(AssertUnwindSafe(|| plugin.discover(path))) {
                Ok(Ok(true)) => applicable.push(plugin.clone()),
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    warn!(
                        plugin = plugin.name(),
                        path = %path.display(),
                        error = %e,
                        "Plugin discovery failed"
                    );
                }
                Err(payload) => {
                    warn!(
                        plugin = plugin.name(),
                        path = %path.display(),
                        panic = %panic_message(payload.as_ref()),
                        "Plugin discovery panicked"
                    );
                }
            }
        }

        applicable
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn AnalyzerPlugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    /// Names of all registered plugins, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
