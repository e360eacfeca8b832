//! Database error types.

use thiserror::Error;

use crate::types::RowId;

/// Database operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Table already exists
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Name cannot be used as a path component
    #[error("Invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    /// Unknown column, wrong value type or inconsistent schema
    #[error("Schema mismatch in table '{table}': {reason}")]
    SchemaMismatch { table: String, reason: String },

    /// Unique column value already owned by another row
    #[error("Unique constraint violated on '{table}.{column}' (held by row {existing})")]
    UniqueConstraintViolation {
        table: String,
        column: String,
        existing: RowId,
    },

    /// Row not found
    #[error("Row {id} not found in table '{table}'")]
    RowNotFound { table: String, id: RowId },

    /// Table lock could not be acquired in time
    #[error("Timed out after {waited_ms}ms waiting for lock on table '{table}' (holder: {})", .holder.as_deref().unwrap_or("unknown"))]
    LockTimeout {
        table: String,
        waited_ms: u64,
        holder: Option<String>,
    },

    /// Unreadable table metadata
    #[error("Corrupt metadata for table '{table}': {reason}")]
    CorruptMetadata { table: String, reason: String },

    /// Unreadable row or index record
    #[error("Corrupt record in table '{table}': {reason}")]
    CorruptRecord { table: String, reason: String },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Disk full error during a write
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl DbError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        DbError::SchemaMismatch {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt_record(table: &str, reason: impl Into<String>) -> Self {
        DbError::CorruptRecord {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}
