//! Graph store error types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`GraphStore`](super::GraphStore) backend.
///
/// These never leave the crate's operation boundary; they are mapped into
/// [`QueryError`](crate::QueryError) by the database context.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query execution error reported by the database.
    #[error("Database error: {0}")]
    Database(String),

    /// Connectivity failure, or use of a closed connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The requested tenant database does not exist.
    #[error("Database '{0}' does not exist")]
    DatabaseNotFound(String),

    /// The database exceeded its time budget.
    #[error("Query timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend cannot serve this kind of request.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Graph snapshot could not be decoded.
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    /// IO error.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Snapshot(err.to_string())
    }
}
