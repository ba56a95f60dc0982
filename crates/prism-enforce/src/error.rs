//! Error types for filter enforcement.

use thiserror::Error;

/// Errors that can occur while building or enforcing identity filters.
#[derive(Debug, Clone, Error)]
pub enum EnforceError {
    /// The principal carries no email, so no identity predicate can be built.
    /// Terminal for that principal: queries must not proceed unscoped.
    #[error("principal '{principal_id}' has no email to scope queries by")]
    MissingEmail { principal_id: String },
}
