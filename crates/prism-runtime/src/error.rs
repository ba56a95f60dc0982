//! Error types for the runtime crate.

use prism_client::{ClientError, ExecutorError};
use prism_core::config::ConfigError;
use prism_enforce::EnforceError;
use thiserror::Error;

/// Errors establishing or switching a session context.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration is unusable; nothing can be queried.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential loading or resolution failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The selected member has no email, so no scoped session can exist for
    /// them. Terminal and user-visible.
    #[error("member '{member_id}' has no email on file; cannot establish a scoped session")]
    MissingEmail { member_id: String },

    /// A query was attempted before any member context was selected.
    #[error("no member context selected")]
    NoActivePrincipal,
}

/// Errors surfaced from a query attempt.
///
/// Backend messages pass through verbatim; nothing here retries. A failed
/// attempt has already been recorded in the audit log by the time the error
/// reaches the caller.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Enforce(#[from] EnforceError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}
