//! Fake analyzer plugins

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use nexus_core::domain::plugin::{AnalyzerPlugin, PluginError};

/// Claims directories containing `marker` and returns a fixed payload
pub struct MarkerPlugin {
    pub name: String,
    pub marker: String,
    pub payload: Value,
    pub analyze_calls: AtomicUsize,
}

impl MarkerPlugin {
    pub fn new(name: &str, marker: &str) -> Self {
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            payload: json!({
                "summary": {"totalFiles": 1, "totalLinesOfCode": 6, "avgComplexity": 3.0, "dependencyCount": 0},
                "codeUnits": [
                    {"id": "main", "type": "FILE", "path": marker, "metrics": {"loc": 6, "complexity": 3.0}}
                ]
            }),
            analyze_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }
}

impl AnalyzerPlugin for MarkerPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&self, path: &Path) -> Result<bool, PluginError> {
        Ok(path.join(&self.marker).exists())
    }

    fn analyze(&self, _path: &Path) -> Result<Value, PluginError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Claims every directory
pub struct AlwaysPlugin {
    pub name: &'static str,
}

impl AnalyzerPlugin for AlwaysPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn discover(&self, _path: &Path) -> Result<bool, PluginError> {
        Ok(true)
    }

    fn analyze(&self, _path: &Path) -> Result<Value, PluginError> {
        Ok(json!({}))
    }
}

/// Discovery always errors
pub struct BrokenDiscoveryPlugin;

impl AnalyzerPlugin for BrokenDiscoveryPlugin {
    fn name(&self) -> &str {
        "BrokenDiscovery"
    }

    fn discover(&self, _path: &Path) -> Result<bool, PluginError> {
        Err(PluginError::Discovery("permission denied".into()))
    }

    fn analyze(&self, _path: &Path) -> Result<Value, PluginError> {
        Ok(json!({}))
    }
}

/// Claims every directory, then fails or panics in `analyze`
pub struct FailingPlugin {
    pub panics: bool,
}

impl AnalyzerPlugin for FailingPlugin {
    fn name(&self) -> &str {
        "Failing"
    }

    fn discover(&self, _path: &Path) -> Result<bool, PluginError> {
        Ok(true)
    }

    fn analyze(&self, _path: &Path) -> Result<Value, PluginError> {
        if self.panics {
            panic!("analyzer crashed");
        }
        Err(PluginError::Analysis("parser exploded".into()))
    }
}

/// Claims every directory and returns a non-object payload
pub struct ListPlugin;

impl AnalyzerPlugin for ListPlugin {
    fn name(&self) -> &str {
        "List"
    }

    fn discover(&self, _path: &Path) -> Result<bool, PluginError> {
        Ok(true)
    }

    fn analyze(&self, _path: &Path) -> Result<Value, PluginError> {
        Ok(json!(["not", "a", "mapping"]))
    }
}

pub fn python_plugin() -> Arc<MarkerPlugin> {
    Arc::new(MarkerPlugin::new("Python", "main.py"))
}
