//! UDM value objects

use serde::{Deserialize, Serialize};

/// Kind of code unit reported by an analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodeUnitType {
    File,
    Class,
    Function,
    Interface,
}

/// Whether a dependency is declared directly or pulled in transitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependencyType {
    #[default]
    Direct,
    Transitive,
}

/// Relationship between two code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionType {
    Call,
    Import,
    Inheritance,
    Implementation,
}

/// Per-unit metrics; analyzers fill in what they can measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CodeUnitMetrics {
    #[serde(default)]
    pub loc: Option<u64>,
    #[serde(default)]
    pub complexity: Option<f64>,
    #[serde(default, alias = "comment_lines")]
    pub comment_lines: Option<u64>,
}

/// Aggregate counters for the whole project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    pub total_files: u64,
    pub total_lines_of_code: u64,
    pub avg_complexity: f64,
    pub dependency_count: u64,
}
