//! Audit logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the audit sink.
///
/// The in-process audit log itself is always on; this only controls the
/// optional best-effort sink that mirrors entries outside the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether a sink is attached at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Mirror entries to stdout as human-readable lines.
    #[serde(default)]
    pub stdout: bool,

    /// Append entries to this file as JSON Lines.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            file_path: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
