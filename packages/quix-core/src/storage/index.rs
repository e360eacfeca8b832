//! Unique-column indexes: `<table>/index_<column>/<fingerprint>` holds the
//! id of the row owning that value.

use std::path::{Path, PathBuf};

use crate::error::DbError;
use crate::hashing::fingerprint;
use crate::types::{RowId, Value};

use super::io_utils::{atomic_write, ensure_dir, read_optional, remove_if_exists, IoPolicy};

/// Directory name holding the index of `column`.
pub fn index_dir_name(column: &str) -> String {
    format!("index_{}", column)
}

/// Maintains one fingerprint-to-row-id index per unique column.
#[derive(Debug, Clone)]
pub struct IndexManager {
    table: String,
    table_dir: PathBuf,
    columns: Vec<String>,
    io: IoPolicy,
}

impl IndexManager {
    pub fn new(table_dir: &Path, table: &str, unique: &[String], io: IoPolicy) -> Self {
        Self {
            table: table.to_string(),
            table_dir: table_dir.to_path_buf(),
            columns: unique.to_vec(),
            io,
        }
    }

    /// Indexed column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Creates the index directories.
    pub fn init(&self) -> Result<(), DbError> {
        for column in &self.columns {
            ensure_dir(&self.table_dir.join(index_dir_name(column)))?;
        }
        Ok(())
    }

    fn entry_path(&self, column: &str, value: &Value) -> Result<PathBuf, DbError> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(DbError::schema(
                &self.table,
                format!("column '{}' has no unique index", column),
            ));
        }
        Ok(self
            .table_dir
            .join(index_dir_name(column))
            .join(fingerprint(value).to_hex()))
    }

    /// Returns the row owning `value` in `column`, if any.
    pub fn lookup(&self, column: &str, value: &Value) -> Result<Option<RowId>, DbError> {
        let path = self.entry_path(column, value)?;
        let Some(bytes) = read_optional(&path, self.io)? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&bytes);
        RowId::parse(&text).map(Some).ok_or_else(|| {
            DbError::corrupt_record(
                &self.table,
                format!("index entry {} holds invalid row id", path.display()),
            )
        })
    }

    /// Fails with `UniqueConstraintViolation` if `value` is owned by a row
    /// other than `id`.
    pub fn check(&self, column: &str, value: &Value, id: Option<&RowId>) -> Result<(), DbError> {
        match self.lookup(column, value)? {
            Some(existing) if Some(&existing) != id => Err(DbError::UniqueConstraintViolation {
                table: self.table.clone(),
                column: column.to_string(),
                existing,
            }),
            _ => Ok(()),
        }
    }

    /// Records that `id` owns `value` in `column`. Re-inserting the same
    /// mapping is a no-op.
    pub fn insert(&self, column: &str, value: &Value, id: &RowId) -> Result<(), DbError> {
        match self.lookup(column, value)? {
            Some(existing) if &existing == id => Ok(()),
            Some(existing) => Err(DbError::UniqueConstraintViolation {
                table: self.table.clone(),
                column: column.to_string(),
                existing,
            }),
            None => {
                let path = self.entry_path(column, value)?;
                if let Some(dir) = path.parent() {
                    ensure_dir(dir)?;
                }
                atomic_write(&path, id.as_str().as_bytes(), self.io)
            }
        }
    }

    /// Removes the entry for `value` in `column`, if present.
    pub fn remove(&self, column: &str, value: &Value) -> Result<(), DbError> {
        let path = self.entry_path(column, value)?;
        remove_if_exists(&path)?;
        Ok(())
    }
}
