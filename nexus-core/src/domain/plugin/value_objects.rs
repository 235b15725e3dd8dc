//! Plugin value objects

use std::fmt;
use std::sync::Arc;

use super::traits::AnalyzerPlugin;

/// Signature of a compiled-in plugin constructor
pub type PluginBuildFn = fn() -> Result<Arc<dyn AnalyzerPlugin>, PluginError>;

/// Entry in the static plugin registration table
///
/// Plugins are not discovered by reflection. Each plugin crate exposes a
/// `PluginFactory` and the binary lists the ones it links in.
#[derive(Clone, Copy)]
pub struct PluginFactory {
    /// Stable identifier used in configuration (`plugins.disabled`) and logs
    pub id: &'static str,
    /// Constructor for the plugin instance
    pub build: PluginBuildFn,
}

impl PluginFactory {
    pub const fn new(id: &'static str, build: PluginBuildFn) -> Self {
        Self { id, build }
    }
}

impl fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginFactory").field("id", &self.id).finish()
    }
}

/// Plugin error
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin failed to load: {0}")]
    Load(String),

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
