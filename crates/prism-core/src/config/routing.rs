//! Metrics backend routing configuration.

use serde::{Deserialize, Serialize};

use crate::secret::SecretToken;

/// Where and how outbound queries reach the metrics backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Backend host, e.g. `semantic-layer.example.com`.
    #[serde(default)]
    pub host: String,

    /// Backend environment identifier attached to every request.
    #[serde(default)]
    pub environment_id: String,

    /// Full connection string override. When set it is used verbatim for
    /// every tenant (single-tenant development mode) and `host` /
    /// `environment_id` are ignored. The embedded token is still masked in
    /// all logging.
    #[serde(default)]
    pub connection_url: Option<String>,

    /// Path of the query endpoint on the backend host.
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    /// Value of the partner-source header attached to requests.
    #[serde(default = "default_partner_source")]
    pub partner_source: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            environment_id: String::new(),
            connection_url: None,
            graphql_path: default_graphql_path(),
            partner_source: default_partner_source(),
        }
    }
}

impl RoutingConfig {
    /// Render the connection string for a resolved credential.
    ///
    /// Same credential + same config always yields the same string, which is
    /// what makes descriptor parsing cacheable.
    pub fn connection_string(&self, token: &SecretToken) -> String {
        if let Some(url) = &self.connection_url {
            return url.clone();
        }
        format!(
            "jdbc:arrow-flight-sql://{}:443?environmentId={}&token={}",
            self.host,
            self.environment_id,
            token.expose()
        )
    }
}

fn default_graphql_path() -> String {
    "/api/graphql".to_string()
}

fn default_partner_source() -> String {
    "prism".to_string()
}
