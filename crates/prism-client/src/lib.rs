//! # prism-client
//!
//! Credential resolution and the metrics backend boundary.
//!
//! This crate provides:
//! - [`CredentialStore`]: tenant → service token resolution with a shared
//!   fallback and a degraded-trust warning when the fallback is used
//! - [`ConnectionDescriptor`] and [`ConnectionManager`]: the single active
//!   backend connection, rebuilt only on tenant switches
//! - the [`QueryExecutor`] boundary and its GraphQL/HTTP implementation
//!   ([`GraphQlExecutor`]): submit a query, poll it to a terminal state,
//!   return typed success or failure
//! - [`MetricsCatalog`]: the metric/dimension metadata the builder entry
//!   point works from
//!
//! Nothing in this crate applies identity filters; callers are expected to
//! pass requests through `prism-enforce` first.

pub mod catalog;
pub mod credentials;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod graphql;
pub mod manager;

pub use catalog::{DimensionMeta, MetricMeta, MetricsCatalog};
pub use credentials::{CredentialStore, TenantCredential};
pub use descriptor::ConnectionDescriptor;
pub use error::ClientError;
pub use executor::{ExecutorError, QueryExecutor, QueryOutcome};
pub use graphql::GraphQlExecutor;
pub use manager::ConnectionManager;
