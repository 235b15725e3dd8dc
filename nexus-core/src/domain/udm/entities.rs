//! UDM entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::SchemaValidationError;
use super::value_objects::{CodeUnitMetrics, CodeUnitType, ConnectionType, DependencyType, Summary};

/// Canonical description of one analyzed project
///
/// Deserializing into this type is the schema validation step: required
/// fields must be present with the right JSON types, optional collections
/// default to empty and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedDataModel {
    pub schema_version: String,
    pub project_name: String,
    pub languages: Vec<String>,
    pub analysis_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub code_units: Vec<CodeUnit>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl UnifiedDataModel {
    /// Validate an untyped payload into the canonical model
    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaValidationError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// A file, class, function or interface reported by an analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeUnit {
    /// Unique within one analysis run
    pub id: String,
    #[serde(rename = "type")]
    pub unit_type: CodeUnitType,
    /// Path relative to the project root
    pub path: String,
    #[serde(default)]
    pub metrics: CodeUnitMetrics,
}

/// A third-party package the project depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<String>,
}

/// Directed edge between two code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source_unit_id: String,
    pub target_unit_id: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
}
