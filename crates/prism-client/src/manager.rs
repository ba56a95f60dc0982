//! The single active backend connection per session.

use prism_core::Principal;
use prism_core::config::{RoutingConfig, TenancyConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::credentials::CredentialStore;
use crate::descriptor::ConnectionDescriptor;
use crate::error::ClientError;

/// Owns the active connection descriptor and rebuilds it on tenant switches.
///
/// For a fixed principal with an unchanged tenant, repeated [`ensure`] calls
/// return the same `Arc` without rebuilding, so connection churn is bounded
/// by tenant switches. The active slot is replaced atomically under a write
/// lock; readers never observe a half-updated descriptor. Parse results are
/// cached by connection string since descriptor construction is pure.
///
/// [`ensure`]: ConnectionManager::ensure
pub struct ConnectionManager {
    tenancy: TenancyConfig,
    routing: RoutingConfig,
    credentials: Arc<CredentialStore>,
    state: RwLock<ManagerState>,
    generation: AtomicU64,
}

#[derive(Default)]
struct ManagerState {
    active: Option<ActiveConnection>,
    parsed: HashMap<String, Arc<ConnectionDescriptor>>,
}

struct ActiveConnection {
    tenant: String,
    descriptor: Arc<ConnectionDescriptor>,
}

impl ConnectionManager {
    pub fn new(
        tenancy: TenancyConfig,
        routing: RoutingConfig,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        Self {
            tenancy,
            routing,
            credentials,
            state: RwLock::new(ManagerState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Return a descriptor authenticated for the principal's tenant.
    ///
    /// A tenant change forces a rebuild regardless of `force_refresh`. A
    /// credential that cannot be resolved at all propagates as an error and
    /// stops query issuance entirely.
    pub fn ensure(
        &self,
        principal: &Principal,
        force_refresh: bool,
    ) -> Result<Arc<ConnectionDescriptor>, ClientError> {
        let tenant = self.tenancy.resolve_tenant(&principal.email).to_string();

        if !force_refresh {
            if let Some(descriptor) = self.active_for(&tenant, &self.read_state()) {
                return Ok(descriptor);
            }
        }

        // Resolve the credential before taking the write lock; failure here
        // must leave the previous connection untouched.
        let credential = self.credentials.credential_for(&tenant)?;
        let connection_string = self.routing.connection_string(&credential.token);

        let mut state = self.write_state();
        if !force_refresh {
            if let Some(descriptor) = self.active_for(&tenant, &state) {
                return Ok(descriptor);
            }
        }

        let descriptor = match state.parsed.get(&connection_string) {
            Some(descriptor) => descriptor.clone(),
            None => {
                let descriptor = Arc::new(ConnectionDescriptor::parse(&connection_string)?);
                state
                    .parsed
                    .insert(connection_string, descriptor.clone());
                descriptor
            }
        };

        let previous_tenant = state.active.as_ref().map(|a| a.tenant.clone());
        state.active = Some(ActiveConnection {
            tenant: tenant.clone(),
            descriptor: descriptor.clone(),
        });
        drop(state);

        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            %tenant,
            previous_tenant = previous_tenant.as_deref().unwrap_or("none"),
            source = %credential.source_env_key,
            token = %credential.token,
            "rebuilt backend connection"
        );

        Ok(descriptor)
    }

    /// Monotonic counter bumped on every rebuild.
    ///
    /// Downstream response caches keyed on a descriptor should also key on
    /// this value so a tenant switch invalidates them.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Tenant of the active connection, if one has been built.
    pub fn active_tenant(&self) -> Option<String> {
        self.read_state().active.as_ref().map(|a| a.tenant.clone())
    }

    /// Drop the active connection; the next [`ensure`](Self::ensure) rebuilds.
    pub fn invalidate(&self) {
        self.write_state().active = None;
    }

    fn active_for(
        &self,
        tenant: &str,
        state: &ManagerState,
    ) -> Option<Arc<ConnectionDescriptor>> {
        state
            .active
            .as_ref()
            .filter(|active| active.tenant == tenant)
            .map(|active| active.descriptor.clone())
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ManagerState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ManagerState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::config::CredentialsConfig;
    use std::collections::HashMap as StdHashMap;

    fn store(entries: &[(&str, &str)]) -> Arc<CredentialStore> {
        let map: StdHashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(
            CredentialStore::from_lookup(
                ["acme", "beta"],
                &CredentialsConfig::default(),
                move |key| map.get(key).cloned(),
            )
            .unwrap(),
        )
    }

    fn tenancy() -> TenancyConfig {
        let mut config = TenancyConfig::default();
        config
            .domains
            .insert("acme.com".to_string(), "acme".to_string());
        config
            .domains
            .insert("beta.com".to_string(), "beta".to_string());
        config
    }

    fn routing() -> RoutingConfig {
        RoutingConfig {
            host: "semantic-layer.example.com".to_string(),
            environment_id: "384973".to_string(),
            ..Default::default()
        }
    }

    fn manager(entries: &[(&str, &str)]) -> ConnectionManager {
        ConnectionManager::new(tenancy(), routing(), store(entries))
    }

    #[test]
    fn repeated_ensure_returns_same_descriptor() {
        let manager = manager(&[("ACME_TOKEN", "acme-secret")]);
        let alice = Principal::new("m-1", "alice@acme.com", "Alice");

        let first = manager.ensure(&alice, false).unwrap();
        let generation = manager.generation();
        let second = manager.ensure(&alice, false).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(manager.generation(), generation);
    }

    #[test]
    fn tenant_switch_forces_rebuild_with_different_credential() {
        let manager = manager(&[("ACME_TOKEN", "acme-secret"), ("BETA_TOKEN", "beta-secret")]);
        let alice = Principal::new("m-1", "alice@acme.com", "Alice");
        let bob = Principal::new("m-2", "bob@beta.com", "Bob");

        let acme = manager.ensure(&alice, false).unwrap();
        let before = manager.generation();
        let beta = manager.ensure(&bob, false).unwrap();

        assert_ne!(*acme, *beta);
        assert_ne!(acme.auth_header(), beta.auth_header());
        assert!(manager.generation() > before);
        assert_eq!(manager.active_tenant().as_deref(), Some("beta"));
    }

    #[test]
    fn switching_back_reuses_cached_parse() {
        let manager = manager(&[("ACME_TOKEN", "acme-secret"), ("BETA_TOKEN", "beta-secret")]);
        let alice = Principal::new("m-1", "alice@acme.com", "Alice");
        let bob = Principal::new("m-2", "bob@beta.com", "Bob");

        let first = manager.ensure(&alice, false).unwrap();
        manager.ensure(&bob, false).unwrap();
        let again = manager.ensure(&alice, false).unwrap();

        // Same parse-cache entry: pointer-identical descriptor.
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn force_refresh_bumps_generation() {
        let manager = manager(&[("ACME_TOKEN", "acme-secret")]);
        let alice = Principal::new("m-1", "alice@acme.com", "Alice");

        manager.ensure(&alice, false).unwrap();
        let before = manager.generation();
        manager.ensure(&alice, true).unwrap();
        assert!(manager.generation() > before);
    }

    #[test]
    fn unresolvable_credential_stops_issuance() {
        // No beta token and no fallback.
        let manager = manager(&[("ACME_TOKEN", "acme-secret")]);
        let bob = Principal::new("m-2", "bob@beta.com", "Bob");

        let err = manager.ensure(&bob, false).unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential { .. }));
        assert!(manager.active_tenant().is_none());
    }

    #[test]
    fn failed_rebuild_keeps_previous_connection() {
        let manager = manager(&[("ACME_TOKEN", "acme-secret")]);
        let alice = Principal::new("m-1", "alice@acme.com", "Alice");
        let bob = Principal::new("m-2", "bob@beta.com", "Bob");

        let acme = manager.ensure(&alice, false).unwrap();
        assert!(manager.ensure(&bob, false).is_err());

        // The acme connection is still intact and reused.
        let again = manager.ensure(&alice, false).unwrap();
        assert!(Arc::ptr_eq(&acme, &again));
    }
}
