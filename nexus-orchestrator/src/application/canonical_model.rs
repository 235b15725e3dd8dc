//! Canonical model builder
//!
//! Turns a raw analyzer payload into a [`UnifiedDataModel`]. The payload is
//! merged over a set of seeded defaults and then validated against the typed
//! schema; nothing else about its contents is inspected.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use nexus_core::domain::udm::{SCHEMA_VERSION, SchemaValidationError, UnifiedDataModel};

/// Errors raised while normalizing a raw payload
#[derive(Debug, thiserror::Error)]
pub enum CanonicalModelError {
    #[error("Analyzer plugins must return a JSON object payload, got {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// Stateless builder for the canonical model
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalModelBuilder;

impl CanonicalModelBuilder {
    /// Merge `raw` into the canonical defaults and validate the result.
    ///
    /// Defaults seeded before the merge: `projectName` (base name of
    /// `project_dir`), `analysisTimestamp` (`now`) and `languages`
    /// (`[plugin_name]`). Keys from `raw` win, except that an empty or null
    /// `languages` falls back to the plugin name, a string `languages` becomes
    /// a one element list, a null `analysisTimestamp` keeps the seeded value
    /// and `schemaVersion` is always the release constant.
    pub fn build(
        raw: Value,
        project_dir: &Path,
        plugin_name: &str,
        now: DateTime<Utc>,
    ) -> Result<UnifiedDataModel, CanonicalModelError> {
        let payload = match raw {
            Value::Object(map) => map,
            other => return Err(CanonicalModelError::NotAnObject(json_kind(&other))),
        };

        let merged = Self::merge(payload, project_dir, plugin_name, now);
        Ok(UnifiedDataModel::from_value(Value::Object(merged))?)
    }

    fn merge(
        payload: Map<String, Value>,
        project_dir: &Path,
        plugin_name: &str,
        now: DateTime<Utc>,
    ) -> Map<String, Value> {
        let project_name = project_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| project_dir.to_string_lossy().into_owned());
        let timestamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true));

        let mut merged = Map::new();
        merged.insert("projectName".into(), Value::String(project_name));
        merged.insert("analysisTimestamp".into(), timestamp.clone());
        merged.insert(
            "languages".into(),
            Value::Array(vec![Value::String(plugin_name.to_string())]),
        );
        merged.extend(payload);

        let languages = match merged.remove("languages") {
            Some(Value::String(language)) if !language.is_empty() => {
                Value::Array(vec![Value::String(language)])
            }
            Some(Value::Array(items)) if !items.is_empty() => Value::Array(items),
            Some(other) if is_truthy(&other) => other,
            _ => Value::Array(vec![Value::String(plugin_name.to_string())]),
        };
        merged.insert("languages".into(), languages);

        if merged.get("analysisTimestamp").is_none_or(Value::is_null) {
            merged.insert("analysisTimestamp".into(), timestamp);
        }

        merged.insert(
            "schemaVersion".into(),
            Value::String(SCHEMA_VERSION.to_string()),
        );

        merged
    }
}

/// Falsy JSON values are replaced by the default
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
