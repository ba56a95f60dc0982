//! Filter clauses and the canonical identity predicate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The dimension the identity predicate is written against.
pub const IDENTITY_DIMENSION: &str = "member__email";

/// An opaque predicate applied to a query's filter set.
///
/// Clause text is canonicalized (trimmed) at construction, and equality is
/// exact string equality on the canonicalized text. The enforcer and the
/// audit violation scan both render identity clauses through
/// [`FilterClause::identity`], so the constructed and verified forms cannot
/// drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "FilterClauseWire")]
pub struct FilterClause {
    sql: String,
}

/// Wire form of [`FilterClause`]; deserialization goes through the
/// canonicalizing constructor.
#[derive(Deserialize)]
struct FilterClauseWire {
    sql: String,
}

impl From<FilterClauseWire> for FilterClause {
    fn from(wire: FilterClauseWire) -> Self {
        Self::new(wire.sql)
    }
}

impl FilterClause {
    /// Wrap an arbitrary predicate, trimming surrounding whitespace.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into().trim().to_string(),
        }
    }

    /// Render the canonical identity clause for an email address.
    ///
    /// Single quotes in the email are doubled so the literal stays intact.
    pub fn identity(email: &str) -> Self {
        let literal = email.replace('\'', "''");
        Self::new(format!(
            "{{{{ Dimension('{IDENTITY_DIMENSION}') }}}} = '{literal}'"
        ))
    }

    /// The rendered predicate text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Whether this clause mentions the identity dimension at all.
    pub fn references_identity_dimension(&self) -> bool {
        self.sql
            .contains(&format!("Dimension('{IDENTITY_DIMENSION}')"))
    }

    /// Best-effort extraction of the value an identity clause compares
    /// against. Returns `None` for clauses that do not reference the identity
    /// dimension or do not look like a single equality.
    pub fn identity_value(&self) -> Option<String> {
        if !self.references_identity_dimension() {
            return None;
        }
        let (_, rhs) = self.sql.split_once('=')?;
        let rhs = rhs.trim();
        let rhs = rhs.strip_prefix('\'')?.strip_suffix('\'')?;
        Some(rhs.replace("''", "'"))
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
