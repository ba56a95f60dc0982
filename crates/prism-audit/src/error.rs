//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur while constructing entries or writing to sinks.
///
/// None of these propagate out of [`AuditLog::record`](crate::AuditLog::record);
/// sink failures are logged and swallowed there.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Entry construction without a principal identity is rejected; an entry
    /// that cannot be attributed cannot be verified.
    #[error("audit entry requires a principal identity")]
    MissingPrincipal,

    /// Failed to write an entry to a sink.
    #[error("failed to write audit entry: {0}")]
    SinkWrite(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
