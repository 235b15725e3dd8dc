//! UDM errors

/// Raised when a merged payload does not match the UDM schema
#[derive(Debug, thiserror::Error)]
#[error("UDM schema validation failed: {0}")]
pub struct SchemaValidationError(#[from] serde_json::Error);
