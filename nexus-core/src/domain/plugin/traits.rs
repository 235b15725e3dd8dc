//! Analyzer plugin trait definition

use std::path::Path;

use super::value_objects::PluginError;

/// Trait that all analyzer plugins must implement
///
/// A plugin handles one project ecosystem. The orchestrator first asks every
/// registered plugin whether it recognises a project directory, then runs the
/// first one that does. Both calls may read the filesystem and are allowed to
/// block; the orchestrator runs them on the blocking thread pool.
pub trait AnalyzerPlugin: Send + Sync {
    /// Unique, human-friendly plugin name (also the default UDM language)
    fn name(&self) -> &str;

    /// Return `true` when the plugin can handle the project at `path`
    fn discover(&self, path: &Path) -> Result<bool, PluginError>;

    /// Analyze the project at `path`
    ///
    /// # Returns
    /// * `Ok(Value)` - Raw payload, expected to be a JSON object shaped like the UDM
    /// * `Err(PluginError)` - The plugin could not analyze the project
    fn analyze(&self, path: &Path) -> Result<serde_json::Value, PluginError>;
}
