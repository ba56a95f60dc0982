//! The identity filter choke point.

use prism_core::Principal;

use crate::clause::FilterClause;
use crate::error::EnforceError;

/// Guarantees every outbound filter set contains the principal's identity
/// predicate.
///
/// The canonical clause is built only from the principal's email, never from
/// candidate input, so agent- or user-supplied filters cannot substitute a
/// different identity. Enforcement is presence-only: a candidate clause that
/// targets the identity dimension with a *different* value is left in place
/// (and surfaced by the audit violation scan) rather than silently rewritten.
pub struct FilterEnforcer;

impl FilterEnforcer {
    /// Render the canonical identity clause for a principal.
    pub fn canonical_clause(principal: &Principal) -> Result<FilterClause, EnforceError> {
        if principal.email.trim().is_empty() {
            return Err(EnforceError::MissingEmail {
                principal_id: principal.id.clone(),
            });
        }
        Ok(FilterClause::identity(&principal.email))
    }

    /// Return a filter set guaranteed to contain the canonical clause.
    ///
    /// Idempotent: enforcing an already-enforced set is a no-op.
    pub fn enforce(
        principal: &Principal,
        mut candidates: Vec<FilterClause>,
    ) -> Result<Vec<FilterClause>, EnforceError> {
        let canonical = Self::canonical_clause(principal)?;
        if !candidates.iter().any(|c| *c == canonical) {
            tracing::debug!(
                principal = %principal.id,
                "appending identity filter to candidate set"
            );
            candidates.push(canonical);
        }
        Ok(candidates)
    }
}
