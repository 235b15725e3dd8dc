//! Domain Layer - Analyzer contract and canonical data model
//!
//! This module contains the analyzer plugin interface consumed by the
//! orchestrator and the Unified Data Model every analysis is normalized into.

pub mod plugin;
pub mod udm;

pub use plugin::*;
pub use udm::*;
