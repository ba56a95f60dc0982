//! Best-effort audit sinks.
//!
//! Sinks mirror entries outside the process. They are advisory: the
//! in-process log is the source of truth and a sink failure never aborts a
//! query flow.

use prism_core::config::AuditConfig;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::entry::AuditEntry;
use crate::error::AuditError;

/// Write-side of an audit mirror.
pub trait AuditSink: Send + Sync {
    fn write(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

/// Drops entries (used when mirroring is disabled).
pub struct NullSink;

impl AuditSink for NullSink {
    fn write(&self, _entry: &AuditEntry) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Prints human-readable lines to stdout.
pub struct ConsoleSink;

impl AuditSink for ConsoleSink {
    fn write(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        println!("{}", entry.to_log_line());
        Ok(())
    }
}

/// Appends JSON Lines to a file.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AuditSink for FileSink {
    fn write(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let json = serde_json::to_string(entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        Ok(())
    }
}

/// Writes to two sinks; the second is attempted even if the first fails.
pub struct DualSink {
    first: Arc<dyn AuditSink>,
    second: Arc<dyn AuditSink>,
}

impl DualSink {
    pub fn new(first: Arc<dyn AuditSink>, second: Arc<dyn AuditSink>) -> Self {
        Self { first, second }
    }
}

impl AuditSink for DualSink {
    fn write(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let first = self.first.write(entry);
        let second = self.second.write(entry);
        first.and(second)
    }
}

/// Build the sink described by configuration.
pub fn sink_from_config(config: &AuditConfig) -> Arc<dyn AuditSink> {
    if !config.enabled {
        return Arc::new(NullSink);
    }
    match (&config.file_path, config.stdout) {
        (Some(path), true) => Arc::new(DualSink::new(
            Arc::new(FileSink::new(path.clone())),
            Arc::new(ConsoleSink),
        )),
        (Some(path), false) => Arc::new(FileSink::new(path.clone())),
        (None, true) => Arc::new(ConsoleSink),
        (None, false) => Arc::new(NullSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::QueryKind;

    fn entry() -> AuditEntry {
        AuditEntry::builder(QueryKind::Dashboard, "alice@acme.com", "dashboard")
            .metrics(["total_claims"])
            .build()
            .unwrap()
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileSink::new(&path);

        sink.write(&entry()).unwrap();
        sink.write(&entry()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.principal_id, "alice@acme.com");
    }

    #[test]
    fn null_sink_accepts_everything() {
        NullSink.write(&entry()).unwrap();
    }

    #[test]
    fn config_selects_sink() {
        let disabled = AuditConfig {
            enabled: false,
            stdout: true,
            file_path: None,
        };
        // Disabled config must produce a sink that never errors.
        sink_from_config(&disabled).write(&entry()).unwrap();
    }
}
