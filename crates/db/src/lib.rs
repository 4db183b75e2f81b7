//! Persistence gateway for the `projects_his` table.
//!
//! One [`ProjectStore`] owns one PostgreSQL connection (no pool). Each
//! [`ProjectStore::insert`] runs a single parameterized `INSERT` in its own
//! transaction: committed on success, rolled back on any failure, with the
//! connection left usable for the next attempt.
//!
//! [`with_store`] is the scoped form: connect, run a body, and close the
//! connection exactly once whatever the body returned.

pub mod config;
pub mod error;
pub mod insert;
pub mod models;
pub mod scope;
pub mod store;

pub use config::{ConfigError, DbConfig};
pub use error::StoreError;
pub use scope::{with_store, Connect, PgConnector, ProjectSink};
pub use store::ProjectStore;
