//! Configuration types for the Prism analytics portal.
//!
//! Configuration is loaded from a YAML file (prism.yaml) into a single
//! [`PrismConfig`] structure. Secrets are never part of the YAML surface;
//! service tokens come from environment variables named by
//! [`CredentialsConfig`].

pub mod audit;
pub mod credentials;
pub mod routing;
pub mod tenancy;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::AuditConfig;
pub use credentials::CredentialsConfig;
pub use routing::RoutingConfig;
pub use tenancy::TenancyConfig;

/// Complete Prism configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrismConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Configuration version.
    #[serde(default)]
    pub version: Option<String>,

    /// Metrics backend routing.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Tenant resolution (email domain → tenant).
    #[serde(default)]
    pub tenancy: TenancyConfig,

    /// Credential environment-key naming.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PrismConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Validate that the configuration is usable for query issuance.
    ///
    /// This is the startup-blocking check: a config that passes here may
    /// still fail credential resolution (checked by the credential store),
    /// but a config that fails here can never produce an authenticated
    /// connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routing.connection_url.is_none() {
            if self.routing.host.trim().is_empty() {
                return Err(ConfigError::Config(
                    "routing.host is required when routing.connection_url is not set".to_string(),
                ));
            }
            if self.routing.environment_id.trim().is_empty() {
                return Err(ConfigError::Config(
                    "routing.environment_id is required when routing.connection_url is not set"
                        .to_string(),
                ));
            }
        }
        if self.tenancy.default_tenant.trim().is_empty() {
            return Err(ConfigError::Config(
                "tenancy.default_tenant must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_yaml() {
        let yaml = r#"
project: member-portal
routing:
  host: semantic-layer.example.com
  environment_id: "384973"
tenancy:
  default_tenant: default
  domains:
    acme.com: acme
    beta.com: beta
credentials:
  env_prefix: SL
audit:
  enabled: true
  stdout: true
"#;
        let config = PrismConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.project.as_deref(), Some("member-portal"));
        assert_eq!(config.routing.environment_id, "384973");
        assert_eq!(config.tenancy.domains.get("acme.com").unwrap(), "acme");
        assert_eq!(config.credentials.env_prefix.as_deref(), Some("SL"));
        config.validate().unwrap();
    }

    #[test]
    fn empty_config_fails_validation() {
        let config = PrismConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Config(_))));
    }

    #[test]
    fn connection_url_override_skips_host_requirement() {
        let yaml = r#"
routing:
  connection_url: "jdbc:arrow-flight-sql://semantic-layer.example.com:443?environmentId=1&token=tok"
"#;
        let config = PrismConfig::from_yaml(yaml).unwrap();
        config.validate().unwrap();
    }
}
