//! Common test utilities for nexus-orchestrator
#![allow(dead_code)]

pub mod fixtures;
pub mod plugins;

pub use fixtures::*;
pub use plugins::*;
