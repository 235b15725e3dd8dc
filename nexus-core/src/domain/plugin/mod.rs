//! Analyzer plugin interface
//!
//! This module defines the contract every analyzer plugin implements. The
//! orchestrator only ever talks to plugins through [`AnalyzerPlugin`], so a
//! Python analyzer and a Java analyzer look the same from the core's side.

pub mod traits;
pub mod value_objects;

pub use traits::*;
pub use value_objects::*;
