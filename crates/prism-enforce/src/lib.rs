//! # prism-enforce
//!
//! The query authorization layer of Prism.
//!
//! This crate provides:
//! - [`FilterClause`] and the canonical identity predicate every query must
//!   carry
//! - [`FilterEnforcer`], the single choke point that guarantees the identity
//!   predicate is present before a query reaches the backend
//! - the [`QueryRequest`] model and its GraphQL rendering
//!
//! Every query path (manual builder, saved-query replay, natural-language
//! agent, tool-calling agent) must pass its filter set through
//! [`FilterEnforcer::enforce`]; none of them talk to the executor directly.

pub mod clause;
pub mod enforcer;
pub mod error;
pub mod request;

pub use clause::{FilterClause, IDENTITY_DIMENSION};
pub use enforcer::FilterEnforcer;
pub use error::EnforceError;
pub use request::{GroupByInput, MetricInput, OrderByInput, QueryRequest, TimeGrain};
