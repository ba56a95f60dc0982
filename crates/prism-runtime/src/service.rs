//! The query choke point.
//!
//! All entry points run queries through [`QueryService::run`]; none of them
//! reach the executor directly. Each attempt leaves exactly one audit entry,
//! recorded with the filters that were attempted even when the attempt fails
//! before or after submission.

use prism_audit::AuditEntry;
use prism_client::{ExecutorError, QueryExecutor, QueryOutcome};
use prism_core::{Principal, QueryKind};
use prism_enforce::{FilterClause, FilterEnforcer, GroupByInput, MetricInput, QueryRequest};

use crate::error::PortalError;
use crate::session::Session;

/// Freeform query pieces proposed by an external agent.
///
/// Nothing in here is trusted: the filters are candidates that still pass
/// through the enforcer, and the tool name is recorded in the audit trail.
#[derive(Debug, Clone, Default)]
pub struct AgentProposal {
    pub metrics: Vec<String>,
    pub group_by: Vec<GroupByInput>,
    pub filters: Vec<String>,
    pub limit: Option<u64>,
}

fn request_from_proposal(proposal: AgentProposal) -> QueryRequest {
    let mut request = QueryRequest::new(proposal.metrics.into_iter().map(MetricInput::new))
        .with_group_by(proposal.group_by)
        .with_filters(proposal.filters.into_iter().map(FilterClause::new));
    if let Some(limit) = proposal.limit {
        request = request.with_limit(limit);
    }
    request
}

/// Runs queries through ensure → enforce → execute → record.
pub struct QueryService<E: QueryExecutor> {
    executor: E,
}

impl<E: QueryExecutor> QueryService<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run one query attempt for the session's active principal.
    ///
    /// The request's candidate filters are replaced by the enforced set
    /// before submission. Failures at any stage are recorded with the
    /// filters as attempted at that stage and then surfaced to the caller.
    pub async fn run(
        &self,
        session: &Session,
        kind: QueryKind,
        origin: &str,
        request: QueryRequest,
    ) -> Result<QueryOutcome, PortalError> {
        let principal = session.principal()?;

        let descriptor = match session.connections().ensure(principal, false) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                self.record(session, &kind, origin, principal, &request, Err(error.to_string()));
                return Err(error.into());
            }
        };

        let request = match FilterEnforcer::enforce(principal, request.filters.clone()) {
            Ok(filters) => QueryRequest { filters, ..request },
            Err(error) => {
                self.record(session, &kind, origin, principal, &request, Err(error.to_string()));
                return Err(error.into());
            }
        };

        match self.executor.execute(&descriptor, &request).await {
            Ok(outcome) => {
                self.record(
                    session,
                    &kind,
                    origin,
                    principal,
                    &request,
                    Ok(outcome.row_count() as u64),
                );
                Ok(outcome)
            }
            Err(error) => {
                self.record(session, &kind, origin, principal, &request, Err(error_text(&error)));
                Err(error.into())
            }
        }
    }

    /// Run an agent-proposed query, logging the tool name with the attempt.
    pub async fn run_agent(
        &self,
        session: &Session,
        tool: &str,
        origin: &str,
        proposal: AgentProposal,
    ) -> Result<QueryOutcome, PortalError> {
        self.run(
            session,
            QueryKind::AgentTool {
                tool: tool.to_string(),
            },
            origin,
            request_from_proposal(proposal),
        )
        .await
    }

    /// Record one attempt. Recording problems are logged, never surfaced:
    /// audit plumbing must not abort the query flow.
    fn record(
        &self,
        session: &Session,
        kind: &QueryKind,
        origin: &str,
        principal: &Principal,
        request: &QueryRequest,
        outcome: Result<u64, String>,
    ) {
        let builder = AuditEntry::builder(kind.clone(), principal.email.clone(), origin)
            .filters(request.filters.iter().map(|c| c.sql().to_string()))
            .metrics(request.metric_names().into_iter().map(str::to_string))
            .dimensions(request.dimension_names());
        let builder = match outcome {
            Ok(rows) => builder.row_count(rows),
            Err(message) => builder.failed(message),
        };
        match builder.build() {
            Ok(entry) => session.audit().record(entry),
            Err(error) => tracing::warn!(%error, "dropping unrecordable audit entry"),
        }
    }
}

/// Backend messages go into the audit trail verbatim, without the error
/// type's framing.
fn error_text(error: &ExecutorError) -> String {
    match error {
        ExecutorError::QueryFailed { message, .. } => message.clone(),
        ExecutorError::Rejected { message } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_converts_to_request() {
        let proposal = AgentProposal {
            metrics: vec!["total_claims".to_string()],
            group_by: vec![GroupByInput::new("member__state")],
            filters: vec!["{{ Dimension('claim__status') }} = 'open'".to_string()],
            limit: Some(10),
        };
        let request = request_from_proposal(proposal);
        assert_eq!(request.metric_names(), vec!["total_claims"]);
        assert_eq!(request.dimension_names(), vec!["member__state"]);
        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.limit, Some(10));
    }

    #[test]
    fn empty_proposal_converts_to_bare_request() {
        let request = request_from_proposal(AgentProposal::default());
        assert!(request.metrics.is_empty());
        assert!(request.filters.is_empty());
        assert!(request.limit.is_none());
    }

    #[test]
    fn error_text_strips_framing_from_backend_failures() {
        let error = ExecutorError::QueryFailed {
            message: "Metric 'x' not found".to_string(),
            compiled_sql: None,
        };
        assert_eq!(error_text(&error), "Metric 'x' not found");

        let malformed = ExecutorError::MalformedResponse("no data".to_string());
        assert_eq!(error_text(&malformed), "malformed backend response: no data");
    }
}
