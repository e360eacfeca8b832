//! Row persistence: one file per row under `<table>/rows/`.

use std::fs::{self, ReadDir};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::types::{Record, Row, RowId};

use super::io_utils::{
    atomic_write, classify_io_error, ensure_dir, read_optional, remove_if_exists, IoPolicy,
};

/// Row directory name inside a table directory.
pub const ROWS_DIR: &str = "rows";

const ROW_VERSION: u32 = 1;

/// Row file format.
#[derive(Debug, Serialize, Deserialize)]
struct RowFile {
    /// Format version
    version: u32,
    /// Owning row id, must match the file name
    id: RowId,
    /// CRC32 of the serialized fields
    checksum: u32,
    /// Column values
    fields: Row,
}

fn fields_checksum(fields: &Row) -> Result<u32, serde_json::Error> {
    Ok(crc32fast::hash(&serde_json::to_vec(fields)?))
}

/// Reads, writes and enumerates row files.
#[derive(Debug, Clone)]
pub struct RowStore {
    table: String,
    dir: PathBuf,
    io: IoPolicy,
}

impl RowStore {
    pub fn new(table_dir: &Path, table: &str, io: IoPolicy) -> Self {
        Self {
            table: table.to_string(),
            dir: table_dir.join(ROWS_DIR),
            io,
        }
    }

    /// Creates the row directory.
    pub fn init(&self) -> Result<(), DbError> {
        ensure_dir(&self.dir)
    }

    fn row_path(&self, id: &RowId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    /// Writes the full field set of row `id`; readers never see a partial file.
    pub fn put(&self, id: &RowId, fields: &Row) -> Result<(), DbError> {
        let encode_err = |e: serde_json::Error| DbError::corrupt_record(&self.table, e.to_string());
        let file = RowFile {
            version: ROW_VERSION,
            id: id.clone(),
            checksum: fields_checksum(fields).map_err(encode_err)?,
            fields: fields.clone(),
        };
        let json = serde_json::to_vec(&file).map_err(encode_err)?;
        atomic_write(&self.row_path(id), &json, self.io)
    }

    /// Loads row `id`, failing with `RowNotFound` if it does not exist.
    pub fn get(&self, id: &RowId) -> Result<Record, DbError> {
        self.try_get(id)?.ok_or_else(|| DbError::RowNotFound {
            table: self.table.clone(),
            id: id.clone(),
        })
    }

    /// Loads row `id` if it exists.
    pub fn try_get(&self, id: &RowId) -> Result<Option<Record>, DbError> {
        match read_optional(&self.row_path(id), self.io)? {
            Some(bytes) => self.decode(id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn decode(&self, id: &RowId, bytes: &[u8]) -> Result<Record, DbError> {
        let file: RowFile = serde_json::from_slice(bytes).map_err(|e| {
            DbError::corrupt_record(&self.table, format!("row {}: {}", id, e))
        })?;

        if file.version != ROW_VERSION {
            return Err(DbError::corrupt_record(
                &self.table,
                format!("row {}: unsupported version {}", id, file.version),
            ));
        }
        if &file.id != id {
            return Err(DbError::corrupt_record(
                &self.table,
                format!("row file {} claims id {}", id, file.id),
            ));
        }
        let checksum = fields_checksum(&file.fields)
            .map_err(|e| DbError::corrupt_record(&self.table, e.to_string()))?;
        if checksum != file.checksum {
            return Err(DbError::corrupt_record(
                &self.table,
                format!(
                    "row {}: checksum mismatch (stored {:08x}, computed {:08x})",
                    id, file.checksum, checksum
                ),
            ));
        }

        Ok(Record {
            id: file.id,
            fields: file.fields,
        })
    }

    /// Removes row `id`. Returns whether a row was removed.
    pub fn delete(&self, id: &RowId) -> Result<bool, DbError> {
        remove_if_exists(&self.row_path(id))
    }

    /// Lazily iterates over all current rows in directory order.
    ///
    /// Each call starts a fresh enumeration. Rows removed while the scan is
    /// running are skipped.
    pub fn scan(&self) -> Result<RowScan<'_>, DbError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| classify_io_error(e, &self.dir.display().to_string()))?;
        Ok(RowScan {
            store: self,
            entries,
        })
    }
}

/// Iterator returned by [`RowStore::scan`].
pub struct RowScan<'a> {
    store: &'a RowStore,
    entries: ReadDir,
}

impl Iterator for RowScan<'_> {
    type Item = Result<Record, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Some(Err(classify_io_error(e, "row scan"))),
            };

            let name = entry.file_name();
            let name = name.to_string_lossy();
            // temp files from in-flight writes
            if name.starts_with('.') {
                continue;
            }
            let Some(id) = RowId::parse(&name) else {
                tracing::warn!(
                    "Skipping unexpected file '{}' in rows of table '{}'",
                    name,
                    self.store.table
                );
                continue;
            };

            match self.store.try_get(&id) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
