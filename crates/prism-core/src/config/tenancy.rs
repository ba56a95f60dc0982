//! Tenant resolution from principal email domains.
//!
//! Each tenant is an organizational boundary with its own service credential.
//! The only signal used to place a principal in a tenant is the domain of
//! their email address.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Configuration for mapping principals to tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Tenant used when an email is malformed or its domain is unmapped.
    #[serde(default = "default_tenant")]
    pub default_tenant: String,

    /// Email domain (case-insensitive) → tenant identifier.
    #[serde(default)]
    pub domains: HashMap<String, String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            default_tenant: default_tenant(),
            domains: HashMap::new(),
        }
    }
}

impl TenancyConfig {
    /// Resolve the tenant for an email address.
    ///
    /// Total: a missing `@`, an empty domain, or an unmapped domain all
    /// resolve to the default tenant. Domain comparison is case-insensitive.
    pub fn resolve_tenant(&self, email: &str) -> &str {
        let Some((local, domain)) = email.rsplit_once('@') else {
            return &self.default_tenant;
        };
        if local.is_empty() || domain.is_empty() {
            return &self.default_tenant;
        }
        let domain = domain.to_ascii_lowercase();
        self.domains
            .get(&domain)
            .map(String::as_str)
            .unwrap_or(&self.default_tenant)
    }

    /// All tenants this configuration can resolve to, default included.
    ///
    /// Used to enumerate the credential env keys to load at startup.
    pub fn known_tenants(&self) -> BTreeSet<&str> {
        let mut tenants: BTreeSet<&str> =
            self.domains.values().map(String::as_str).collect();
        tenants.insert(&self.default_tenant);
        tenants
    }
}

fn default_tenant() -> String {
    "default".to_string()
}
