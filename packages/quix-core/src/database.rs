//! Database handle binding a root directory to its tables.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::storage::io_utils::{classify_io_error, ensure_dir};
use crate::storage::metadata::META_FILE;
use crate::table::{SelectOptions, Table};
use crate::types::{ColumnType, Record, Row, RowId, Schema};

/// Opens (creating if needed) the database rooted at `path` with default settings.
pub fn connect(path: impl Into<PathBuf>) -> Result<Database, DbError> {
    Database::connect_with_config(DbConfig::with_data_dir(path))
}

/// Database handle holding the opened tables.
///
/// Handles are independent: several handles, in one process or many, may
/// point at the same directory. Table locks live on disk, not here.
#[derive(Debug)]
pub struct Database {
    /// Configuration, including the root directory
    config: DbConfig,
    /// Map of table name to opened table
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl Database {
    /// Opens the database described by `config`, registering every
    /// subdirectory that holds table metadata.
    ///
    /// Tables with unreadable metadata are logged and skipped.
    pub fn connect_with_config(config: DbConfig) -> Result<Self, DbError> {
        ensure_dir(&config.data_dir)?;

        let mut tables = HashMap::new();
        let entries = fs::read_dir(&config.data_dir)
            .map_err(|e| classify_io_error(e, &config.data_dir.display().to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| classify_io_error(e, "table scan"))?;
            let path = entry.path();
            if !path.join(META_FILE).is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match Table::open(&config, &name) {
                Ok(table) => {
                    tables.insert(name, Arc::new(table));
                }
                Err(e) => tracing::warn!("Skipping table '{}': {}", name, e),
            }
        }

        tracing::info!(
            "Connected to {} ({} tables)",
            config.data_dir.display(),
            tables.len()
        );
        Ok(Self {
            config,
            tables: RwLock::new(tables),
        })
    }

    /// Root directory of this database.
    pub fn path(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Creates a table if it does not exist yet.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `columns` - Column names and types
    /// * `unique` - Columns whose values must be unique
    ///
    /// # Returns
    /// `Result<Arc<Table>, DbError>` containing the table. If the table
    /// already existed its persisted schema is kept unchanged.
    pub fn create_table(
        &self,
        name: &str,
        columns: &[(&str, ColumnType)],
        unique: &[&str],
    ) -> Result<Arc<Table>, DbError> {
        let schema = Schema::new(columns.iter().copied(), unique.iter().copied());
        self.create_table_with_schema(name, schema)
    }

    /// Same as [`Database::create_table`] with a prebuilt schema.
    pub fn create_table_with_schema(
        &self,
        name: &str,
        schema: Schema,
    ) -> Result<Arc<Table>, DbError> {
        if let Some(table) = self.cached(name)? {
            return Ok(table);
        }
        let table = Arc::new(Table::create(&self.config, name, schema)?);
        let mut tables = self.tables.write().map_err(|_| DbError::LockPoisoned)?;
        Ok(Arc::clone(
            tables.entry(name.to_string()).or_insert(table),
        ))
    }

    fn cached(&self, name: &str) -> Result<Option<Arc<Table>>, DbError> {
        let tables = self.tables.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(tables.get(name).cloned())
    }

    /// Gets a table by name.
    ///
    /// Tables created by other handles after connect are opened on first use.
    pub fn table(&self, name: &str) -> Result<Arc<Table>, DbError> {
        if let Some(table) = self.cached(name)? {
            return Ok(table);
        }
        let table = Arc::new(Table::open(&self.config, name)?);
        let mut tables = self.tables.write().map_err(|_| DbError::LockPoisoned)?;
        Ok(Arc::clone(
            tables.entry(name.to_string()).or_insert(table),
        ))
    }

    /// Returns the sorted names of the opened tables.
    pub fn table_names(&self) -> Result<Vec<String>, DbError> {
        let tables = self.tables.read().map_err(|_| DbError::LockPoisoned)?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn insert(&self, table: &str, data: &Row) -> Result<RowId, DbError> {
        self.table(table)?.insert(data)
    }

    pub fn select(&self, table: &str, filter: &Row) -> Result<Vec<Record>, DbError> {
        self.table(table)?.select(filter)
    }

    pub fn select_one(&self, table: &str, filter: &Row) -> Result<Option<Record>, DbError> {
        self.table(table)?.select_one(filter)
    }

    pub fn select_with(
        &self,
        table: &str,
        filter: &Row,
        options: &SelectOptions,
    ) -> Result<Vec<Record>, DbError> {
        self.table(table)?.select_with(filter, options)
    }

    pub fn update(&self, table: &str, filter: &Row, data: &Row) -> Result<usize, DbError> {
        self.table(table)?.update(filter, data)
    }

    pub fn delete(&self, table: &str, filter: &Row) -> Result<usize, DbError> {
        self.table(table)?.delete(filter)
    }
}
