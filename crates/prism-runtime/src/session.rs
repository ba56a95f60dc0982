//! Explicit per-session state.

use prism_audit::{AuditLog, sink_from_config};
use prism_client::{ConnectionManager, CredentialStore};
use prism_core::config::PrismConfig;
use prism_core::Principal;
use std::sync::Arc;

use crate::error::SessionError;
use crate::roster::MemberRecord;

/// Everything the system holds for one active user session.
///
/// One principal and one backend connection at a time. The principal is
/// replaced wholesale by [`select_member`](Self::select_member); the
/// connection follows it on the next ensure. Components receive this object
/// explicitly — nothing reads session state through globals.
pub struct Session {
    config: Arc<PrismConfig>,
    connections: ConnectionManager,
    audit: Arc<AuditLog>,
    active: Option<Principal>,
}

impl Session {
    /// Assemble a session from already-constructed collaborators.
    pub fn new(
        config: Arc<PrismConfig>,
        credentials: Arc<CredentialStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        let connections = ConnectionManager::new(
            config.tenancy.clone(),
            config.routing.clone(),
            credentials,
        );
        Self {
            config,
            connections,
            audit,
            active: None,
        }
    }

    /// Validate configuration, load credentials from the environment and
    /// build a fresh session. This is the startup path: any error here
    /// blocks query issuance entirely.
    pub fn bootstrap(config: PrismConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let credentials = CredentialStore::from_env(
            config.tenancy.known_tenants(),
            &config.credentials,
        )?;
        let audit = AuditLog::with_sink(sink_from_config(&config.audit));
        Ok(Self::new(
            Arc::new(config),
            Arc::new(credentials),
            Arc::new(audit),
        ))
    }

    /// Select the active member context.
    ///
    /// Requires a non-empty email: a member the system cannot scope queries
    /// for cannot be selected at all.
    pub fn select_member(&mut self, member: MemberRecord) -> Result<&Principal, SessionError> {
        let email = member
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(SessionError::MissingEmail {
                member_id: member.id.clone(),
            })?
            .to_string();

        tracing::info!(
            member = %member.id,
            previous = self
                .active
                .as_ref()
                .map(|p| p.id.as_str())
                .unwrap_or("none"),
            "switching member context"
        );

        Ok(self.active.insert(Principal {
            id: member.id,
            email,
            display_name: member.display_name.unwrap_or_default(),
            attrs: member.attrs,
        }))
    }

    /// The active principal, or an error when none is selected.
    pub fn principal(&self) -> Result<&Principal, SessionError> {
        self.active.as_ref().ok_or(SessionError::NoActivePrincipal)
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }
}
