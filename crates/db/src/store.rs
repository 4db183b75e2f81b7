//! Single-connection project store.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::types::Json;
use sqlx::Connection;

use projhis_core::types::DbId;
use projhis_core::{FieldValue, ProjectField, ProjectRecord};

use crate::config::DbConfig;
use crate::error::StoreError;
use crate::insert::{insert_statement, COLUMNS, TABLE};
use crate::models::project::ProjectRow;

/// Owns one database connection and writes project records through it.
///
/// The connection is opened by [`connect`](Self::connect) and released by
/// [`close`](Self::close) (or on drop). An insert on a closed store opens a
/// fresh connection from the stored options first.
#[derive(Debug)]
pub struct ProjectStore {
    options: PgConnectOptions,
    conn: Option<PgConnection>,
}

impl ProjectStore {
    /// Open a connection using `config`.
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        Self::connect_with(config.connect_options()).await
    }

    pub async fn connect_with(options: PgConnectOptions) -> Result<Self, StoreError> {
        let conn = open(&options).await?;
        Ok(Self {
            options,
            conn: Some(conn),
        })
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Round-trip a trivial query to check the connection is alive.
    pub async fn ping(&mut self) -> Result<(), StoreError> {
        self.connection().await?.ping().await.map_err(StoreError::Query)
    }

    /// Insert `record`, returning the new row id.
    pub async fn insert(&mut self, record: &ProjectRecord) -> Result<DbId, StoreError> {
        self.insert_with(record, |_| Ok(())).await
    }

    /// Insert `record` and run `before_commit` with the new id before the
    /// transaction commits.
    ///
    /// Only the record's present fields are named in the statement. If the
    /// statement, the hook, or the commit fails, the transaction is rolled
    /// back and nothing is stored.
    pub async fn insert_with<F>(
        &mut self,
        record: &ProjectRecord,
        before_commit: F,
    ) -> Result<DbId, StoreError>
    where
        F: FnOnce(DbId) -> std::io::Result<()> + Send,
    {
        let fields = record.present_fields();
        let conn = self.connection().await?;
        let result = insert_in_transaction(conn, &fields, before_commit).await;

        match &result {
            Ok(id) => {
                tracing::info!(id, columns = fields.len(), "Inserted project record");
            }
            Err(e) if e.is_connection_lost() => {
                tracing::warn!(error = %e, "Connection lost during insert; it will be reopened");
                self.conn = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Insert rolled back");
            }
        }
        result
    }

    /// Read one stored record back by id.
    pub async fn find_by_id(&mut self, id: DbId) -> Result<Option<ProjectRow>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM {TABLE} WHERE id = $1");
        let conn = self.connection().await?;
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(StoreError::Query)
    }

    /// Close the connection. Closing an already-closed store is a no-op.
    pub async fn close(&mut self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await.map_err(StoreError::Close)?;
            tracing::debug!("Database connection closed");
        }
        Ok(())
    }

    async fn connection(&mut self) -> Result<&mut PgConnection, StoreError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                tracing::info!("Reopening database connection");
                open(&self.options).await?
            }
        };
        Ok(self.conn.insert(conn))
    }
}

async fn open(options: &PgConnectOptions) -> Result<PgConnection, StoreError> {
    let conn = PgConnection::connect_with(options)
        .await
        .map_err(StoreError::Connect)?;
    tracing::debug!("Database connection opened");
    Ok(conn)
}

async fn insert_in_transaction<F>(
    conn: &mut PgConnection,
    fields: &[(ProjectField, FieldValue<'_>)],
    before_commit: F,
) -> Result<DbId, StoreError>
where
    F: FnOnce(DbId) -> std::io::Result<()> + Send,
{
    let columns: Vec<ProjectField> = fields.iter().map(|(field, _)| *field).collect();
    let sql = insert_statement(&columns);

    let mut tx = conn.begin().await.map_err(StoreError::Insert)?;

    let mut query = sqlx::query_scalar::<_, DbId>(&sql);
    for (_, value) in fields {
        query = match *value {
            FieldValue::Text(s) => query.bind(s),
            FieldValue::Decimal(v) => query.bind(v),
            FieldValue::Integer(v) => query.bind(v),
            FieldValue::Json(map) => query.bind(Json(map.clone())),
            FieldValue::Timestamp(t) => query.bind(t),
        };
    }

    let id = match query.fetch_one(&mut *tx).await {
        Ok(id) => id,
        Err(e) => {
            rollback(tx).await;
            return Err(StoreError::Insert(e));
        }
    };

    if let Err(e) = before_commit(id) {
        rollback(tx).await;
        return Err(StoreError::Attachment(e));
    }

    tx.commit().await.map_err(StoreError::Insert)?;
    Ok(id)
}

async fn rollback(tx: sqlx::Transaction<'_, sqlx::Postgres>) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "Rollback failed");
    }
}
