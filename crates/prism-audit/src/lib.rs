//! # prism-audit
//!
//! Append-only audit trail for every query attempt.
//!
//! This crate provides:
//! - [`AuditEntry`]: a fixed-shape record of one query attempt (who, what,
//!   which filters, outcome), created at the point of invocation so failures
//!   are recorded too
//! - [`AuditLog`]: the in-process append-only log with aggregate
//!   [`stats`](AuditLog::stats) and a [`violations`](AuditLog::violations)
//!   scan that re-verifies the identity filter invariant independently of
//!   the enforcement code path
//! - [`AuditSink`] and its console / file / composite implementations for
//!   best-effort mirroring outside the process
//!
//! Recording never fails: a sink error must not abort the user's query flow.

pub mod entry;
pub mod error;
pub mod log;
pub mod sink;

pub use entry::{AuditEntry, AuditEntryBuilder, QueryStatus};
pub use error::AuditError;
pub use log::{AuditLog, AuditStats, Violation, ViolationKind};
pub use sink::{AuditSink, ConsoleSink, DualSink, FileSink, NullSink, sink_from_config};
