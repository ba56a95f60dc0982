//! The principal source boundary.
//!
//! Candidate members come from an external roster (CSV upload, HR system,
//! identity provider). The core only requires that a selected member has a
//! non-empty email; everything else is display data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A candidate principal as supplied by the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub attrs: serde_json::Value,
}

impl MemberRecord {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            display_name: None,
            attrs: serde_json::Value::Null,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Supplies candidate members for selection.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn members(&self) -> anyhow::Result<Vec<MemberRecord>>;
}

/// Fixed in-memory roster (tests, demos, the CLI).
pub struct StaticRoster {
    members: Vec<MemberRecord>,
}

impl StaticRoster {
    pub fn new(members: Vec<MemberRecord>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn members(&self) -> anyhow::Result<Vec<MemberRecord>> {
        Ok(self.members.clone())
    }
}
