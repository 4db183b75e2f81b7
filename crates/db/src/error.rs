/// Failure of a gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database could not be reached when opening the connection.
    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// The insert or its commit failed. The transaction was rolled back.
    #[error("Insert failed: {0}")]
    Insert(#[source] sqlx::Error),

    /// The pre-commit hook failed. The transaction was rolled back.
    #[error("Attachment staging failed: {0}")]
    Attachment(#[source] std::io::Error),

    /// A read or liveness query failed.
    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Closing the connection failed.
    #[error("Closing the connection failed: {0}")]
    Close(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether the failure means the connection itself is gone, as opposed
    /// to the statement being rejected.
    pub fn is_connection_lost(&self) -> bool {
        let err = match self {
            Self::Connect(e) | Self::Insert(e) | Self::Query(e) | Self::Close(e) => e,
            Self::Attachment(_) => return false,
        };
        matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::Protocol(_)
                | sqlx::Error::WorkerCrashed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failure_counts_as_connection_lost() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(StoreError::Insert(sqlx::Error::Io(io)).is_connection_lost());
    }

    #[test]
    fn rejected_statement_keeps_connection() {
        assert!(!StoreError::Insert(sqlx::Error::RowNotFound).is_connection_lost());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!StoreError::Attachment(io).is_connection_lost());
    }

    #[test]
    fn display_includes_cause() {
        let err = StoreError::Insert(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("Insert failed:"));
    }
}
