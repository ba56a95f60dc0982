//! Tenant credential resolution.
//!
//! Tokens are read from the environment exactly once, at store construction.
//! After that the store is read-only: a tenant either has its own token or
//! resolves to the shared fallback, and the fallback path always emits a
//! warning because it lowers tenant isolation.

use prism_core::config::CredentialsConfig;
use prism_core::secret::SecretToken;
use std::collections::BTreeMap;

use crate::error::ClientError;

/// A service credential bound to one tenant.
#[derive(Debug, Clone)]
pub struct TenantCredential {
    /// Tenant this credential belongs to; `"*"` for the shared fallback.
    pub tenant_id: String,

    /// The service token, masked in all formatting.
    pub token: SecretToken,

    /// The environment variable the token was loaded from.
    pub source_env_key: String,
}

impl TenantCredential {
    /// Whether this is the shared fallback rather than a tenant-specific
    /// credential.
    pub fn is_fallback(&self) -> bool {
        self.tenant_id == FALLBACK_TENANT
    }
}

/// Tenant marker used for the shared fallback credential.
pub const FALLBACK_TENANT: &str = "*";

/// Read-only map of tenant → credential, loaded once at startup.
#[derive(Debug)]
pub struct CredentialStore {
    tenants: BTreeMap<String, TenantCredential>,
    fallback: Option<TenantCredential>,
}

impl CredentialStore {
    /// Load credentials from the process environment for the given tenants.
    pub fn from_env<I, T>(tenants: I, config: &CredentialsConfig) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::from_lookup(tenants, config, |key| std::env::var(key).ok())
    }

    /// Load credentials through an arbitrary key lookup.
    ///
    /// Empty or whitespace-only values are treated as absent. Fails when
    /// nothing usable is found at all, since no tenant could ever be
    /// authenticated.
    pub fn from_lookup<I, T, F>(
        tenants: I,
        config: &CredentialsConfig,
        lookup: F,
    ) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut map = BTreeMap::new();
        for tenant in tenants {
            let tenant = tenant.as_ref();
            let key = config.tenant_key(tenant);
            if let Some(value) = lookup(&key) {
                let value = value.trim();
                if !value.is_empty() {
                    map.insert(
                        tenant.to_string(),
                        TenantCredential {
                            tenant_id: tenant.to_string(),
                            token: SecretToken::new(value),
                            source_env_key: key,
                        },
                    );
                }
            }
        }

        let fallback_key = config.fallback_key();
        let fallback = lookup(&fallback_key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| TenantCredential {
                tenant_id: FALLBACK_TENANT.to_string(),
                token: SecretToken::new(value),
                source_env_key: fallback_key.clone(),
            });

        if map.is_empty() && fallback.is_none() {
            return Err(ClientError::NoCredentialsConfigured { fallback_key });
        }

        for credential in map.values() {
            tracing::info!(
                tenant = %credential.tenant_id,
                source = %credential.source_env_key,
                token = %credential.token,
                "loaded tenant credential"
            );
        }

        Ok(Self {
            tenants: map,
            fallback,
        })
    }

    /// Resolve the credential for a tenant.
    ///
    /// A tenant-specific token is returned when present; otherwise the
    /// shared fallback with a warning, since the query will not be isolated
    /// by a tenant-scoped credential. Never returns another tenant's token.
    pub fn credential_for(&self, tenant: &str) -> Result<&TenantCredential, ClientError> {
        if let Some(credential) = self.tenants.get(tenant) {
            return Ok(credential);
        }
        match &self.fallback {
            Some(fallback) => {
                tracing::warn!(
                    tenant,
                    source = %fallback.source_env_key,
                    "tenant credential not found, falling back to shared token (degraded tenant isolation)"
                );
                Ok(fallback)
            }
            None => Err(ClientError::MissingCredential {
                tenant: tenant.to_string(),
            }),
        }
    }

    /// Whether a tenant-specific credential exists.
    pub fn has_tenant(&self, tenant: &str) -> bool {
        self.tenants.contains_key(tenant)
    }

    /// The shared fallback credential, when configured.
    pub fn fallback(&self) -> Option<&TenantCredential> {
        self.fallback.as_ref()
    }

    /// Tenants with a specific credential, in stable order.
    pub fn tenants(&self) -> impl Iterator<Item = &TenantCredential> {
        self.tenants.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(entries: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn resolves_tenant_specific_token() {
        let store = CredentialStore::from_lookup(
            ["acme", "beta"],
            &CredentialsConfig::default(),
            lookup(&[("ACME_TOKEN", "acme-secret"), ("BETA_TOKEN", "beta-secret")]),
        )
        .unwrap();

        let acme = store.credential_for("acme").unwrap();
        assert_eq!(acme.token.expose(), "acme-secret");
        assert_eq!(acme.source_env_key, "ACME_TOKEN");
        assert!(!acme.is_fallback());

        let beta = store.credential_for("beta").unwrap();
        assert_eq!(beta.token.expose(), "beta-secret");
    }

    #[test]
    fn never_returns_another_tenants_token() {
        let store = CredentialStore::from_lookup(
            ["acme", "beta"],
            &CredentialsConfig::default(),
            lookup(&[("ACME_TOKEN", "acme-secret"), ("TOKEN", "shared-secret")]),
        )
        .unwrap();

        // beta has no token of its own: it must get the shared fallback,
        // not acme's credential.
        let beta = store.credential_for("beta").unwrap();
        assert_eq!(beta.token.expose(), "shared-secret");
        assert!(beta.is_fallback());
    }

    #[test]
    fn missing_tenant_falls_back_to_shared_token() {
        let store = CredentialStore::from_lookup(
            ["beta"],
            &CredentialsConfig::default(),
            lookup(&[("TOKEN", "fallback-secret")]),
        )
        .unwrap();

        let credential = store.credential_for("beta").unwrap();
        assert_eq!(credential.token.expose(), "fallback-secret");
        assert_eq!(credential.source_env_key, "TOKEN");
    }

    #[test]
    fn empty_values_are_treated_as_absent() {
        let store = CredentialStore::from_lookup(
            ["acme"],
            &CredentialsConfig::default(),
            lookup(&[("ACME_TOKEN", "   "), ("TOKEN", "fallback-secret")]),
        )
        .unwrap();

        assert!(!store.has_tenant("acme"));
        assert!(store.credential_for("acme").unwrap().is_fallback());
    }

    #[test]
    fn no_credentials_at_all_is_startup_blocking() {
        let err = CredentialStore::from_lookup(
            ["acme"],
            &CredentialsConfig::default(),
            lookup(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::NoCredentialsConfigured { .. }));
    }

    #[test]
    fn missing_tenant_without_fallback_is_terminal() {
        let store = CredentialStore::from_lookup(
            ["acme"],
            &CredentialsConfig::default(),
            lookup(&[("ACME_TOKEN", "acme-secret")]),
        )
        .unwrap();

        let err = store.credential_for("beta").unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential { tenant } if tenant == "beta"));
    }

    #[test]
    fn prefixed_keys_are_used_when_configured() {
        let config = CredentialsConfig {
            env_prefix: Some("SL".to_string()),
        };
        let store = CredentialStore::from_lookup(
            ["acme"],
            &config,
            lookup(&[("SL_ACME_TOKEN", "acme-secret"), ("SL_TOKEN", "shared")]),
        )
        .unwrap();

        assert_eq!(
            store.credential_for("acme").unwrap().source_env_key,
            "SL_ACME_TOKEN"
        );
        assert_eq!(store.fallback().unwrap().source_env_key, "SL_TOKEN");
    }
}
