//! Table engine: constraint-checked insert, update and delete.
//!
//! Each table has:
//! - An immutable schema persisted in `meta`
//! - One record file per row
//! - One fingerprint index per unique column
//! - A lock marker serializing every mutation

use std::path::{Path, PathBuf};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::lock::LockManager;
use crate::storage::io_utils::ensure_dir;
use crate::storage::{IndexManager, IoPolicy, MetadataStore, RowStore};
use crate::types::{Record, Row, RowId, Schema};

use super::validation;

/// A table bound to its directory.
#[derive(Debug)]
pub struct Table {
    /// Table name
    pub(super) name: String,
    /// Table directory
    pub(super) dir: PathBuf,
    /// Immutable schema
    pub(super) schema: Schema,
    /// Row files
    pub(super) rows: RowStore,
    /// Unique column indexes
    pub(super) indexes: IndexManager,
    /// Mutation lock
    pub(super) locks: LockManager,
}

impl Table {
    /// Creates the table if absent.
    ///
    /// When the table already has metadata this is a no-op and the
    /// persisted schema is kept, whatever `schema` says.
    ///
    /// # Arguments
    /// * `config` - Database configuration (root directory, lock and I/O settings)
    /// * `name` - Table name
    /// * `schema` - Column types and unique columns
    ///
    /// # Returns
    /// `Result<Table, DbError>` containing the created or existing table.
    pub fn create(config: &DbConfig, name: &str, schema: Schema) -> Result<Self, DbError> {
        validation::validate_name("table", name)?;
        validation::validate_schema(name, &schema)?;

        let dir = config.data_dir.join(name);
        ensure_dir(&dir)?;

        let io = io_policy(config);
        let locks = LockManager::new(config);
        let lock = locks.acquire(&dir, name)?;

        let meta = MetadataStore::new(&dir, name, io);
        let schema = if meta.exists() {
            let existing = meta.load()?;
            if existing != schema {
                tracing::warn!(
                    "Table '{}' already exists with a different schema; keeping the existing one",
                    name
                );
            }
            existing
        } else {
            // metadata last: its presence marks the table as created
            RowStore::new(&dir, name, io).init()?;
            IndexManager::new(&dir, name, &schema.unique, io).init()?;
            match meta.create(&schema) {
                Ok(()) => tracing::info!(
                    "Created table '{}' with {} columns ({} unique)",
                    name,
                    schema.columns.len(),
                    schema.unique.len()
                ),
                Err(DbError::TableAlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
            schema
        };

        lock.release()?;
        Ok(Self::assemble(dir, name, schema, io, locks))
    }

    /// Opens an existing table, failing with `TableNotFound` if it has no metadata.
    pub fn open(config: &DbConfig, name: &str) -> Result<Self, DbError> {
        validation::validate_name("table", name)?;

        let dir = config.data_dir.join(name);
        let io = io_policy(config);
        let schema = MetadataStore::new(&dir, name, io).load()?;

        Ok(Self::assemble(dir, name, schema, io, LockManager::new(config)))
    }

    fn assemble(dir: PathBuf, name: &str, schema: Schema, io: IoPolicy, locks: LockManager) -> Self {
        Self {
            name: name.to_string(),
            rows: RowStore::new(&dir, name, io),
            indexes: IndexManager::new(&dir, name, &schema.unique, io),
            dir,
            schema,
            locks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Inserts a new row.
    ///
    /// Every unique column present in `data` is checked before anything is
    /// written, so a violation leaves no trace.
    ///
    /// # Arguments
    /// * `data` - Column values; omitted columns stay absent
    ///
    /// # Returns
    /// `Result<RowId, DbError>` containing the assigned row id.
    pub fn insert(&self, data: &Row) -> Result<RowId, DbError> {
        validation::validate_values(&self.name, &self.schema, data)?;

        let lock = self.locks.acquire(&self.dir, &self.name)?;

        for column in self.indexes.columns() {
            if let Some(value) = data.get(column) {
                self.indexes.check(column, value, None)?;
            }
        }

        let id = RowId::generate();
        self.rows.put(&id, data)?;
        for column in self.indexes.columns() {
            if let Some(value) = data.get(column) {
                self.indexes.insert(column, value, &id)?;
            }
        }

        lock.release()?;
        tracing::debug!("Inserted row {} into '{}'", id, self.name);
        Ok(id)
    }

    /// Merges `data` into every row matching `filter`.
    ///
    /// All-or-nothing: every target is resolved and every unique conflict
    /// checked before the first write. Setting a unique column on more than
    /// one row is itself a conflict. An empty `filter` matches all rows; an
    /// empty `data` updates nothing.
    ///
    /// # Returns
    /// `Result<usize, DbError>` containing the number of rows updated.
    pub fn update(&self, filter: &Row, data: &Row) -> Result<usize, DbError> {
        validation::validate_values(&self.name, &self.schema, filter)?;
        validation::validate_values(&self.name, &self.schema, data)?;
        if data.is_empty() {
            return Ok(0);
        }

        let lock = self.locks.acquire(&self.dir, &self.name)?;
        let targets = self.resolve(filter, None)?;

        let touched: Vec<&String> = self
            .indexes
            .columns()
            .iter()
            .filter(|c| data.contains_key(*c))
            .collect();

        for column in &touched {
            if targets.len() > 1 {
                return Err(DbError::UniqueConstraintViolation {
                    table: self.name.clone(),
                    column: column.to_string(),
                    existing: targets[0].id.clone(),
                });
            }
            for target in &targets {
                self.indexes.check(column, &data[*column], Some(&target.id))?;
            }
        }

        for target in &targets {
            self.apply_update(target, data, &touched)?;
        }

        lock.release()?;
        tracing::debug!("Updated {} rows in '{}'", targets.len(), self.name);
        Ok(targets.len())
    }

    fn apply_update(&self, target: &Record, data: &Row, touched: &[&String]) -> Result<(), DbError> {
        for column in touched {
            let new_value = &data[*column];
            match target.fields.get(*column) {
                Some(old_value) if old_value != new_value => {
                    self.indexes.remove(column, old_value)?;
                }
                _ => {}
            }
        }

        let mut merged = target.fields.clone();
        merged.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.rows.put(&target.id, &merged)?;

        for column in touched {
            self.indexes.insert(column, &data[*column], &target.id)?;
        }
        Ok(())
    }

    /// Deletes every row matching `filter`, index entries first.
    ///
    /// An empty `filter` matches all rows. No match is a zero count, not an error.
    ///
    /// # Returns
    /// `Result<usize, DbError>` containing the number of rows deleted.
    pub fn delete(&self, filter: &Row) -> Result<usize, DbError> {
        validation::validate_values(&self.name, &self.schema, filter)?;

        let lock = self.locks.acquire(&self.dir, &self.name)?;
        let targets = self.resolve(filter, None)?;

        let mut deleted = 0;
        for target in &targets {
            for column in self.indexes.columns() {
                if let Some(value) = target.fields.get(column) {
                    self.indexes.remove(column, value)?;
                }
            }
            if self.rows.delete(&target.id)? {
                deleted += 1;
            }
        }

        lock.release()?;
        tracing::debug!("Deleted {} rows from '{}'", deleted, self.name);
        Ok(deleted)
    }
}

fn io_policy(config: &DbConfig) -> IoPolicy {
    IoPolicy {
        sync_writes: config.sync_writes,
        max_retries: config.io_max_retries,
        retry_delay_ms: config.io_retry_delay_ms,
    }
}
