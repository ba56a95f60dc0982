//! The query execution boundary.
//!
//! Everything past this trait is the backend protocol client; the portal
//! core only hands it enforcer-approved payloads and consumes typed results.

use async_trait::async_trait;
use prism_enforce::QueryRequest;
use thiserror::Error;

use crate::descriptor::ConnectionDescriptor;

/// Tabular result of a successful query.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// Result rows as returned by the backend.
    pub rows: Vec<serde_json::Value>,

    /// The SQL the backend compiled for this query, when reported.
    pub compiled_sql: Option<String>,
}

impl QueryOutcome {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Typed failure from the executor boundary.
///
/// Backend messages are carried verbatim; the core surfaces rather than
/// translates them. Intermediate poll states never appear here, only
/// terminal failures.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The request never produced a response.
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the submission outright.
    #[error("backend rejected the request: {message}")]
    Rejected { message: String },

    /// The query reached a terminal failed state.
    #[error("query failed: {message}")]
    QueryFailed {
        message: String,
        compiled_sql: Option<String>,
    },

    /// The response did not match the expected envelope.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

/// Submits a query and drives it to a terminal state.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        descriptor: &ConnectionDescriptor,
        request: &QueryRequest,
    ) -> Result<QueryOutcome, ExecutorError>;
}
