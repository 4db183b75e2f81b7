//! Scoped acquisition of a project store.
//!
//! [`with_store`] opens a sink through a [`Connect`] implementation, hands it
//! to a body, and closes it exactly once afterwards, whether the body
//! succeeded or failed. If the body panics the sink is dropped, which for
//! [`ProjectStore`] drops the socket.

use std::future::Future;

use futures::future::BoxFuture;
use sqlx::postgres::PgConnectOptions;

use projhis_core::types::DbId;
use projhis_core::ProjectRecord;

use crate::config::DbConfig;
use crate::error::StoreError;
use crate::store::ProjectStore;

/// Something records can be inserted into and that must be closed.
pub trait ProjectSink: Send {
    /// Insert `record`, running `before_commit` with the new id before commit.
    fn insert_with<F>(
        &mut self,
        record: &ProjectRecord,
        before_commit: F,
    ) -> impl Future<Output = Result<DbId, StoreError>> + Send
    where
        F: FnOnce(DbId) -> std::io::Result<()> + Send;

    /// Release the underlying resource.
    fn close(&mut self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Opens [`ProjectSink`]s.
pub trait Connect: Send + Sync {
    type Sink: ProjectSink;

    fn connect(&self) -> impl Future<Output = Result<Self::Sink, StoreError>> + Send;
}

impl ProjectSink for ProjectStore {
    fn insert_with<F>(
        &mut self,
        record: &ProjectRecord,
        before_commit: F,
    ) -> impl Future<Output = Result<DbId, StoreError>> + Send
    where
        F: FnOnce(DbId) -> std::io::Result<()> + Send,
    {
        ProjectStore::insert_with(self, record, before_commit)
    }

    fn close(&mut self) -> impl Future<Output = Result<(), StoreError>> + Send {
        ProjectStore::close(self)
    }
}

/// Connects [`ProjectStore`]s to PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    pub fn new(config: &DbConfig) -> Self {
        Self::from_options(config.connect_options())
    }

    pub fn from_options(options: PgConnectOptions) -> Self {
        Self { options }
    }
}

impl Connect for PgConnector {
    type Sink = ProjectStore;

    fn connect(&self) -> impl Future<Output = Result<ProjectStore, StoreError>> + Send {
        ProjectStore::connect_with(self.options.clone())
    }
}

/// Connect, run `body` with the sink, then close it.
///
/// The close happens exactly once on every path where the connection was
/// opened. A close failure is logged and does not replace the body's result.
/// If connecting fails, `body` is not run.
pub async fn with_store<C, T, F>(connector: &C, body: F) -> Result<T, StoreError>
where
    C: Connect,
    F: for<'s> FnOnce(&'s mut C::Sink) -> BoxFuture<'s, Result<T, StoreError>>,
{
    let mut sink = connector.connect().await?;
    let result = body(&mut sink).await;
    if let Err(e) = sink.close().await {
        tracing::warn!(error = %e, "Failed to close database connection");
    }
    result
}
