//! Audit entry types.

use chrono::{DateTime, Utc};
use prism_core::QueryKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuditError;

/// Terminal outcome of a query attempt.
///
/// Intermediate poll states are never recorded; an entry exists only with a
/// terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Failed,
}

/// One query attempt, recorded at the point of invocation.
///
/// The shape is fixed: required identity fields are enforced at
/// construction, and entries are never mutated after they are appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID.
    pub entry_id: Uuid,

    /// When the attempt was recorded.
    pub recorded_at: DateTime<Utc>,

    /// Which entry point produced the query (agent paths carry the tool name).
    pub query_kind: QueryKind,

    /// The principal's stable identity attribute (their email) — the value
    /// the identity filter must scope the query to.
    pub principal_id: String,

    /// Rendered filter clauses that were attempted on this query, recorded
    /// even when submission failed.
    pub filters_applied: Vec<String>,

    /// Metrics requested.
    pub metrics: Vec<String>,

    /// Grouping dimensions requested.
    pub dimensions: Vec<String>,

    /// Rows returned, for successful queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,

    /// Terminal outcome.
    pub status: QueryStatus,

    /// Backend error message, verbatim, for failed queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Page or surface the query originated from.
    pub origin: String,
}

impl AuditEntry {
    /// Start building an entry for one query attempt.
    pub fn builder(
        query_kind: QueryKind,
        principal_id: impl Into<String>,
        origin: impl Into<String>,
    ) -> AuditEntryBuilder {
        AuditEntryBuilder {
            query_kind,
            principal_id: principal_id.into(),
            origin: origin.into(),
            filters_applied: Vec::new(),
            metrics: Vec::new(),
            dimensions: Vec::new(),
            row_count: None,
            status: QueryStatus::Success,
            error_message: None,
        }
    }

    /// Format the entry as a human-readable log line.
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} kind={} principal={} origin={} filters={}",
            self.recorded_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            match self.status {
                QueryStatus::Success => "QUERY_OK",
                QueryStatus::Failed => "QUERY_FAILED",
            },
            self.query_kind,
            self.principal_id,
            self.origin,
            self.filters_applied.len(),
        );
        if let Some(rows) = self.row_count {
            line.push_str(&format!(" rows={rows}"));
        }
        if let Some(ref error) = self.error_message {
            line.push_str(&format!(" error=\"{}\"", error.replace('"', "'")));
        }
        line
    }
}

/// Builder for one audit entry.
#[derive(Debug)]
pub struct AuditEntryBuilder {
    query_kind: QueryKind,
    principal_id: String,
    origin: String,
    filters_applied: Vec<String>,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    row_count: Option<u64>,
    status: QueryStatus,
    error_message: Option<String>,
}

impl AuditEntryBuilder {
    /// Record the filter clauses that were attempted.
    pub fn filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters_applied = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    pub fn dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = dimensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn row_count(mut self, rows: u64) -> Self {
        self.row_count = Some(rows);
        self
    }

    /// Mark the attempt as failed with the backend's message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = QueryStatus::Failed;
        self.error_message = Some(error.into());
        self
    }

    /// Finish the entry; rejects construction without a principal identity.
    pub fn build(self) -> Result<AuditEntry, AuditError> {
        if self.principal_id.trim().is_empty() {
            return Err(AuditError::MissingPrincipal);
        }
        Ok(AuditEntry {
            entry_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            query_kind: self.query_kind,
            principal_id: self.principal_id,
            filters_applied: self.filters_applied,
            metrics: self.metrics,
            dimensions: self.dimensions,
            row_count: self.row_count,
            status: self.status,
            error_message: self.error_message,
            origin: self.origin,
        })
    }
}
