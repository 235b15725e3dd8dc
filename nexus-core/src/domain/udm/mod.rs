//! Unified Data Model (UDM)
//!
//! The canonical, versioned description of one analyzed project. Every
//! analyzer plugin's raw payload is normalized into these types before it is
//! persisted or returned to a reader, so the JSON shape here is the public
//! contract (camelCase keys, upper-case enum literals, RFC 3339 timestamps).

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use value_objects::*;

/// Schema version stamped on every UDM produced by this release
pub const SCHEMA_VERSION: &str = "1.0.0";
