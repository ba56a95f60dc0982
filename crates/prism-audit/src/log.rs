//! The append-only audit log.

use prism_enforce::FilterClause;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::entry::{AuditEntry, QueryStatus};
use crate::sink::AuditSink;

/// Aggregate statistics over the current log.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditStats {
    pub total_queries: usize,
    pub unique_principals: usize,
    /// Percentage of successful attempts, 0–100.
    pub success_rate: f64,
    pub by_kind: BTreeMap<String, usize>,
    pub by_origin: BTreeMap<String, usize>,
}

/// Why an entry was flagged by the violation scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// No filter in the entry equals the canonical identity clause for the
    /// entry's own principal.
    MissingIdentityFilter,
    /// The canonical clause is present, but another identity-dimension
    /// clause targets a different principal.
    ForeignIdentityFilter,
}

/// A flagged audit entry.
#[derive(Debug, Clone)]
pub struct Violation {
    pub kind: ViolationKind,
    pub entry: AuditEntry,
}

/// Append-only, in-process record of every query attempt.
///
/// Appends happen in invocation order and recording never fails; a sink
/// error is logged and swallowed so audit plumbing cannot abort a user's
/// query. Entries are only removed by the operator-triggered
/// [`clear`](Self::clear).
#[derive(Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a best-effort mirror sink.
    pub fn with_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            sink: Some(sink),
        }
    }

    /// Append an entry. Never fails.
    pub fn record(&self, entry: AuditEntry) {
        if let Some(sink) = &self.sink {
            if let Err(error) = sink.write(&entry) {
                tracing::warn!(%error, "audit sink write failed; entry kept in memory only");
            }
        }
        self.write_entries().push(entry);
    }

    /// Snapshot of all entries, in invocation order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.read_entries().clone()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// Aggregate statistics over the current log.
    pub fn stats(&self) -> AuditStats {
        let entries = self.read_entries();
        let total = entries.len();

        let principals: BTreeSet<&str> =
            entries.iter().map(|e| e.principal_id.as_str()).collect();
        let successes = entries
            .iter()
            .filter(|e| e.status == QueryStatus::Success)
            .count();

        let mut by_kind = BTreeMap::new();
        let mut by_origin = BTreeMap::new();
        for entry in entries.iter() {
            *by_kind.entry(entry.query_kind.to_string()).or_insert(0) += 1;
            *by_origin.entry(entry.origin.clone()).or_insert(0) += 1;
        }

        AuditStats {
            total_queries: total,
            unique_principals: principals.len(),
            success_rate: if total == 0 {
                0.0
            } else {
                successes as f64 / total as f64 * 100.0
            },
            by_kind,
            by_origin,
        }
    }

    /// Scan the log for identity filter violations.
    ///
    /// This re-derives the canonical clause from each entry's own
    /// `principal_id` and checks the recorded filters, independently of the
    /// enforcement code path, so entry points that bypass the enforcer are
    /// still caught here.
    pub fn violations(&self) -> Vec<Violation> {
        self.read_entries()
            .iter()
            .filter_map(|entry| {
                let canonical = FilterClause::identity(&entry.principal_id);
                let clauses: Vec<FilterClause> = entry
                    .filters_applied
                    .iter()
                    .map(|sql| FilterClause::new(sql.as_str()))
                    .collect();

                if !clauses.iter().any(|c| *c == canonical) {
                    return Some(Violation {
                        kind: ViolationKind::MissingIdentityFilter,
                        entry: entry.clone(),
                    });
                }
                let foreign = clauses.iter().any(|clause| {
                    clause
                        .identity_value()
                        .is_some_and(|value| value != entry.principal_id)
                });
                if foreign {
                    return Some(Violation {
                        kind: ViolationKind::ForeignIdentityFilter,
                        entry: entry.clone(),
                    });
                }
                None
            })
            .collect()
    }

    /// Remove every entry. Operator-triggered only; nothing in the library
    /// calls this.
    pub fn clear(&self) {
        self.write_entries().clear();
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<AuditEntry>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, Vec<AuditEntry>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
