//! # prism-runtime
//!
//! Session context and query orchestration.
//!
//! A [`Session`] owns the state the rest of the system needs per active
//! user: configuration, the credential store, the connection manager, the
//! audit log and the selected principal. It is passed explicitly to every
//! call; there is no ambient session storage.
//!
//! [`QueryService`] is the one place queries are run from. Every path —
//! dashboard panels, the manual builder, saved-query replay, LLM and
//! tool-calling agents — goes ensure → enforce → execute → record, and every
//! attempt leaves exactly one audit entry, failures included.

pub mod error;
pub mod roster;
pub mod service;
pub mod session;

pub use error::{PortalError, SessionError};
pub use roster::{MemberRecord, RosterProvider, StaticRoster};
pub use service::{AgentProposal, QueryService};
pub use session::Session;
