// Error types for the task store

use crate::models::TaskId;
use thiserror::Error;

/// Errors returned by [`Store`](crate::Store) operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or its schema bootstrapped
    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// No task row matched the identifier
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// A statement failed to execute or a row failed to decode
    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Beginning or committing a transaction failed
    #[error("Transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
