use serde::{Deserialize, Serialize};
use std::fmt;

// Configuration types shared across all Prism crates
pub mod config;
pub mod secret;

// Re-export commonly used types for convenience
pub use config::{
    AuditConfig, ConfigError, CredentialsConfig, PrismConfig, RoutingConfig, TenancyConfig,
};
pub use secret::{SecretToken, mask_token};

/// The end-user context every query must stay scoped to.
///
/// A principal is created when a session selects a member context and is
/// immutable for the lifetime of that context. Switching members replaces the
/// principal wholesale; it is never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier from the roster (never used for filtering).
    pub id: String,

    /// The identity attribute queries are filtered on.
    pub email: String,

    /// Display name for operator surfaces.
    #[serde(default)]
    pub display_name: String,

    /// Arbitrary tenant attributes carried along for downstream surfaces.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub attrs: serde_json::Value,
}

impl Principal {
    /// Create a principal with no extra attributes.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: display_name.into(),
            attrs: serde_json::Value::Null,
        }
    }
}

/// Which entry point produced a query.
///
/// Agent-driven paths carry the tool name so the audit trail records which
/// tool issued the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Pre-built member dashboard panels.
    Dashboard,
    /// Manual query builder.
    QueryBuilder,
    /// Replay of a saved query definition.
    SavedQuery,
    /// Natural-language query path.
    LlmQuery,
    /// Tool-calling agent path, tagged with the tool that was invoked.
    AgentTool { tool: String },
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Dashboard => write!(f, "dashboard"),
            QueryKind::QueryBuilder => write!(f, "query_builder"),
            QueryKind::SavedQuery => write!(f, "saved_query"),
            QueryKind::LlmQuery => write!(f, "llm_query"),
            QueryKind::AgentTool { tool } => write!(f, "agent_tool:{tool}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_kind_display_includes_tool_name() {
        let kind = QueryKind::AgentTool {
            tool: "query_metrics".to_string(),
        };
        assert_eq!(kind.to_string(), "agent_tool:query_metrics");
        assert_eq!(QueryKind::QueryBuilder.to_string(), "query_builder");
    }

    #[test]
    fn query_kind_serializes_snake_case() {
        let json = serde_json::to_value(QueryKind::SavedQuery).unwrap();
        assert_eq!(json, serde_json::json!("saved_query"));
    }

    #[test]
    fn principal_round_trips() {
        let p = Principal::new("m-1", "alice@acme.com", "Alice");
        let json = serde_json::to_string(&p).unwrap();
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.email, "alice@acme.com");
        assert_eq!(back.id, "m-1");
    }
}
