//! Error types for credential resolution and connection management.

use thiserror::Error;

/// Errors that can occur before a query ever reaches the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No tenant tokens and no fallback token are present in the
    /// environment. Startup-blocking: no authenticated connection can ever
    /// be built from this configuration.
    #[error(
        "no service credentials configured: set per-tenant token variables or the fallback '{fallback_key}'"
    )]
    NoCredentialsConfigured { fallback_key: String },

    /// The tenant has no specific token and no fallback exists. Terminal for
    /// the session: query issuance must stop rather than proceed
    /// unauthenticated.
    #[error("no credential available for tenant '{tenant}' and no fallback token is set")]
    MissingCredential { tenant: String },

    /// The connection string could not be parsed into a descriptor.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// The connection string carries no token parameter.
    #[error("connection string is missing the token parameter")]
    MissingToken,
}
