//! Per-table schema persistence (`<table>/meta`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::types::{ColumnType, Schema};

use super::io_utils::{atomic_write, read_optional, IoPolicy};

/// Metadata file name inside a table directory.
pub const META_FILE: &str = "meta";

const META_VERSION: u32 = 1;

/// Metadata file format.
#[derive(Debug, Serialize, Deserialize)]
struct MetaFile {
    /// Format version
    version: u32,
    /// Table name
    name: String,
    /// Column name to type tag
    columns: BTreeMap<String, ColumnType>,
    /// Unique column names
    #[serde(default)]
    unique: Vec<String>,
}

/// Reads and writes a table's schema.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    table: String,
    path: PathBuf,
    io: IoPolicy,
}

impl MetadataStore {
    pub fn new(table_dir: &Path, table: &str, io: IoPolicy) -> Self {
        Self {
            table: table.to_string(),
            path: table_dir.join(META_FILE),
            io,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persists `schema`, failing with `TableAlreadyExists` if metadata is
    /// already present.
    pub fn create(&self, schema: &Schema) -> Result<(), DbError> {
        if self.exists() {
            return Err(DbError::TableAlreadyExists(self.table.clone()));
        }

        let meta = MetaFile {
            version: META_VERSION,
            name: self.table.clone(),
            columns: schema.columns.clone(),
            unique: schema.unique.clone(),
        };
        let json = serde_json::to_vec_pretty(&meta).map_err(|e| DbError::CorruptMetadata {
            table: self.table.clone(),
            reason: e.to_string(),
        })?;

        atomic_write(&self.path, &json, self.io)
    }

    /// Loads the schema, failing with `TableNotFound` if absent.
    pub fn load(&self) -> Result<Schema, DbError> {
        let bytes = read_optional(&self.path, self.io)?.ok_or_else(|| DbError::TableNotFound {
            table: self.table.clone(),
        })?;

        let corrupt = |reason: String| DbError::CorruptMetadata {
            table: self.table.clone(),
            reason,
        };

        let meta: MetaFile =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(format!("parse error: {}", e)))?;

        if meta.version != META_VERSION {
            return Err(corrupt(format!("unsupported version {}", meta.version)));
        }
        if meta.name != self.table {
            tracing::warn!(
                "Metadata for table '{}' names it '{}'; using directory name",
                self.table,
                meta.name
            );
        }
        if let Some(missing) = meta.unique.iter().find(|c| !meta.columns.contains_key(*c)) {
            return Err(corrupt(format!(
                "unique column '{}' is not a declared column",
                missing
            )));
        }

        Ok(Schema {
            columns: meta.columns,
            unique: meta.unique,
        })
    }
}
