//! GraphQL implementation of the executor boundary.
//!
//! Queries are created with a mutation, then polled until they reach a
//! terminal state. Intermediate states are not errors; a terminal failure
//! carries the backend's message verbatim.

use async_trait::async_trait;
use prism_core::config::RoutingConfig;
use prism_enforce::QueryRequest;
use serde::Deserialize;
use std::time::Duration;

use crate::catalog::{MetricMeta, MetricsCatalog};
use crate::descriptor::ConnectionDescriptor;
use crate::executor::{ExecutorError, QueryExecutor, QueryOutcome};

const GET_RESULTS_DOCUMENT: &str = "\
query GetQueryResults($environmentId: BigInt!, $queryId: String!) {
  query(environmentId: $environmentId, queryId: $queryId) {
    queryId
    status
    sql
    error
    jsonResult
  }
}";

const METRICS_DOCUMENT: &str = "\
query Metrics($environmentId: BigInt!) {
  metrics(environmentId: $environmentId) {
    name
    description
    dimensions {
      name
      type
    }
  }
}";

/// Lifecycle states reported while a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollStatus {
    Pending,
    Running,
    Compiled,
    Failed,
    Successful,
}

impl PollStatus {
    fn parse(raw: &str) -> Result<Self, ExecutorError> {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "compiled" => Ok(Self::Compiled),
            "failed" => Ok(Self::Failed),
            "successful" => Ok(Self::Successful),
            other => Err(ExecutorError::MalformedResponse(format!(
                "unknown query status '{other}'"
            ))),
        }
    }
}

/// GraphQL response envelope; expected error states are data, not panics.
#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<serde_json::Value>,

    #[serde(default)]
    errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

impl GraphQlEnvelope {
    fn into_data(self) -> Result<serde_json::Value, ExecutorError> {
        if let Some(errors) = self.errors {
            if let Some(first) = errors.first() {
                return Err(ExecutorError::Rejected {
                    message: first.message.clone(),
                });
            }
        }
        self.data
            .ok_or_else(|| ExecutorError::MalformedResponse("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CreatedQuery {
    #[serde(rename = "queryId")]
    query_id: String,
}

#[derive(Debug, Deserialize)]
struct PolledQuery {
    status: String,

    #[serde(default)]
    sql: Option<String>,

    #[serde(default)]
    error: Option<String>,

    #[serde(default, rename = "jsonResult")]
    json_result: Option<serde_json::Value>,
}

/// The metrics backend client.
pub struct GraphQlExecutor {
    http: reqwest::Client,
    graphql_path: String,
    partner_source: String,
    poll_interval: Duration,
}

impl GraphQlExecutor {
    fn user_agent() -> String {
        format!("prism/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn new(routing: &RoutingConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            graphql_path: routing.graphql_path.clone(),
            partner_source: routing.partner_source.clone(),
            poll_interval: Duration::from_millis(200),
        }
    }

    /// Override the fixed delay between poll requests.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Submit one GraphQL request and unwrap the envelope.
    ///
    /// The descriptor's environment id is merged into the variables so no
    /// caller can address a different backend environment than the one the
    /// credential was resolved for.
    async fn submit(
        &self,
        descriptor: &ConnectionDescriptor,
        document: &str,
        mut variables: serde_json::Value,
    ) -> Result<serde_json::Value, ExecutorError> {
        if let (Some(env_id), Some(object)) =
            (descriptor.environment_id(), variables.as_object_mut())
        {
            object.insert(
                "environmentId".to_string(),
                serde_json::Value::String(env_id.to_string()),
            );
        }

        let url = descriptor.endpoint(&self.graphql_path);
        tracing::info!(
            %url,
            snippet = &document[..document.len().min(60)],
            "submitting backend request"
        );

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, descriptor.auth_header())
            .header("x-partner-source", &self.partner_source)
            .json(&serde_json::json!({
                "query": document,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = &body[..body.len().min(500)], "backend request failed");
            return Err(ExecutorError::Rejected {
                message: format!("backend returned {status}: {body}"),
            });
        }

        let envelope: GraphQlEnvelope = response.json().await?;
        envelope.into_data()
    }

    /// Fetch the metric catalog for the active connection.
    pub async fn fetch_metrics(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<MetricsCatalog, ExecutorError> {
        let data = self
            .submit(descriptor, METRICS_DOCUMENT, serde_json::json!({}))
            .await?;
        let metrics = data.get("metrics").cloned().ok_or_else(|| {
            ExecutorError::MalformedResponse("metrics field missing".to_string())
        })?;
        let metrics: Vec<MetricMeta> = serde_json::from_value(metrics)
            .map_err(|e| ExecutorError::MalformedResponse(e.to_string()))?;
        Ok(MetricsCatalog::new(metrics))
    }

    fn rows_from_result(json_result: Option<serde_json::Value>) -> Vec<serde_json::Value> {
        match json_result {
            Some(serde_json::Value::Array(rows)) => rows,
            Some(serde_json::Value::Object(mut table)) => match table.remove("data") {
                Some(serde_json::Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl QueryExecutor for GraphQlExecutor {
    async fn execute(
        &self,
        descriptor: &ConnectionDescriptor,
        request: &QueryRequest,
    ) -> Result<QueryOutcome, ExecutorError> {
        let data = self
            .submit(descriptor, &request.document(), request.variables())
            .await?;

        let created = data.get("createQuery").cloned().ok_or_else(|| {
            ExecutorError::MalformedResponse("createQuery field missing".to_string())
        })?;
        let created: CreatedQuery = serde_json::from_value(created)
            .map_err(|e| ExecutorError::MalformedResponse(e.to_string()))?;
        tracing::info!(query_id = %created.query_id, "query submitted");

        loop {
            let data = self
                .submit(
                    descriptor,
                    GET_RESULTS_DOCUMENT,
                    serde_json::json!({ "queryId": created.query_id }),
                )
                .await?;

            let polled = data.get("query").cloned().ok_or_else(|| {
                ExecutorError::MalformedResponse("query field missing".to_string())
            })?;
            let polled: PolledQuery = serde_json::from_value(polled)
                .map_err(|e| ExecutorError::MalformedResponse(e.to_string()))?;

            match PollStatus::parse(&polled.status)? {
                PollStatus::Successful => {
                    return Ok(QueryOutcome {
                        rows: Self::rows_from_result(polled.json_result),
                        compiled_sql: polled.sql,
                    });
                }
                PollStatus::Failed => {
                    let message = polled
                        .error
                        .unwrap_or_else(|| "query failed without an error message".to_string());
                    tracing::error!(query_id = %created.query_id, error = %message, "query failed");
                    return Err(ExecutorError::QueryFailed {
                        message,
                        compiled_sql: polled.sql,
                    });
                }
                status => {
                    tracing::debug!(query_id = %created.query_id, ?status, "query still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_enforce::MetricInput;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor() -> GraphQlExecutor {
        GraphQlExecutor::new(&RoutingConfig::default())
            .with_poll_interval(Duration::from_millis(10))
    }

    fn descriptor(server: &MockServer) -> ConnectionDescriptor {
        let mut params = BTreeMap::new();
        params.insert("environmentid".to_string(), "384973".to_string());
        ConnectionDescriptor::from_parts(server.uri(), params, "Bearer test-token")
    }

    fn request() -> QueryRequest {
        QueryRequest::new([MetricInput::new("total_claims")])
    }

    #[tokio::test]
    async fn executes_query_to_successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains("CreateQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "createQuery": { "queryId": "q-1" } }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .and(body_string_contains("GetQueryResults"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "query": {
                    "status": "SUCCESSFUL",
                    "sql": "SELECT 1",
                    "jsonResult": { "data": [{ "total_claims": 42 }] }
                } }
            })))
            .mount(&server)
            .await;

        let outcome = executor()
            .execute(&descriptor(&server), &request())
            .await
            .unwrap();

        assert_eq!(outcome.row_count(), 1);
        assert_eq!(outcome.compiled_sql.as_deref(), Some("SELECT 1"));
    }

    #[tokio::test]
    async fn polls_through_intermediate_states() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("CreateQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "createQuery": { "queryId": "q-2" } }
            })))
            .mount(&server)
            .await;

        // First two polls are non-terminal, then the query succeeds.
        Mock::given(method("POST"))
            .and(body_string_contains("GetQueryResults"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "query": { "status": "PENDING" } }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetQueryResults"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "query": { "status": "RUNNING" } }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetQueryResults"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "query": { "status": "SUCCESSFUL", "jsonResult": [] } }
            })))
            .mount(&server)
            .await;

        let outcome = executor()
            .execute(&descriptor(&server), &request())
            .await
            .unwrap();
        assert_eq!(outcome.row_count(), 0);
    }

    #[tokio::test]
    async fn terminal_failure_carries_backend_message_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("CreateQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "createQuery": { "queryId": "q-3" } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("GetQueryResults"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "query": {
                    "status": "FAILED",
                    "sql": "SELECT broken",
                    "error": "Metric 'total_claims' not found"
                } }
            })))
            .mount(&server)
            .await;

        let err = executor()
            .execute(&descriptor(&server), &request())
            .await
            .unwrap_err();

        match err {
            ExecutorError::QueryFailed {
                message,
                compiled_sql,
            } => {
                assert_eq!(message, "Metric 'total_claims' not found");
                assert_eq!(compiled_sql.as_deref(), Some("SELECT broken"));
            }
            other => panic!("expected QueryFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn graphql_error_envelope_is_a_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "environment not found" }]
            })))
            .mount(&server)
            .await;

        let err = executor()
            .execute(&descriptor(&server), &request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Rejected { message } if message == "environment not found"
        ));
    }

    #[tokio::test]
    async fn fetches_metric_catalog() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "metrics": [
                    { "name": "total_claims", "dimensions": [
                        { "name": "metric_time", "type": "TIME" }
                    ] }
                ] }
            })))
            .mount(&server)
            .await;

        let catalog = executor().fetch_metrics(&descriptor(&server)).await.unwrap();
        assert!(catalog.metric("total_claims").is_some());
        assert!(catalog.is_time_dimension("metric_time"));
    }
}
