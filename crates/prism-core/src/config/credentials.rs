//! Environment-key naming for tenant credentials.
//!
//! Tokens themselves never appear in configuration files; this only decides
//! which environment variables hold them. Each tenant gets
//! `<TENANT>_TOKEN`, and one shared `TOKEN` acts as the fallback. An
//! optional prefix namespaces both (`SL_ACME_TOKEN`, `SL_TOKEN`).

use serde::{Deserialize, Serialize};

/// Credential environment-key configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Optional prefix for all credential environment keys.
    #[serde(default)]
    pub env_prefix: Option<String>,
}

impl CredentialsConfig {
    /// Environment key holding the token for a specific tenant.
    pub fn tenant_key(&self, tenant: &str) -> String {
        match &self.env_prefix {
            Some(prefix) => format!("{}_{}_TOKEN", prefix, env_segment(tenant)),
            None => format!("{}_TOKEN", env_segment(tenant)),
        }
    }

    /// Environment key holding the shared fallback token.
    pub fn fallback_key(&self) -> String {
        match &self.env_prefix {
            Some(prefix) => format!("{prefix}_TOKEN"),
            None => "TOKEN".to_string(),
        }
    }
}

/// Uppercase a tenant id into a valid env-key segment.
fn env_segment(tenant: &str) -> String {
    tenant
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_without_prefix_match_plain_shape() {
        let config = CredentialsConfig::default();
        assert_eq!(config.tenant_key("acme"), "ACME_TOKEN");
        assert_eq!(config.fallback_key(), "TOKEN");
    }

    #[test]
    fn keys_with_prefix_are_namespaced() {
        let config = CredentialsConfig {
            env_prefix: Some("SL".to_string()),
        };
        assert_eq!(config.tenant_key("acme"), "SL_ACME_TOKEN");
        assert_eq!(config.fallback_key(), "SL_TOKEN");
    }

    #[test]
    fn tenant_ids_are_sanitized_for_env_keys() {
        let config = CredentialsConfig::default();
        assert_eq!(config.tenant_key("retail-plus"), "RETAIL_PLUS_TOKEN");
    }
}
