//! I/O utilities shared by the metadata, row and index stores.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::DbError;

/// Write behavior taken from the database configuration.
#[derive(Debug, Clone, Copy)]
pub struct IoPolicy {
    /// Fsync temporary files before renaming
    pub sync_writes: bool,
    /// Maximum retry attempts for transient I/O errors
    pub max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for IoPolicy {
    fn default() -> Self {
        Self {
            sync_writes: true,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

/// Classifies I/O errors into specific DbError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            DbError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            DbError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => DbError::IoError(format!("{}: {}", context, error)),
    }
}

/// Retries an operation that may fail with transient I/O errors.
pub fn retry_io_operation<F, T>(
    mut operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, DbError>
where
    F: FnMut() -> Result<T, DbError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(DbError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Temporary sibling path for `path`, unique per process.
///
/// Starts with a dot so directory scans can skip it.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
}

/// Writes `contents` to `path` so readers see either the old file or the
/// complete new one: temp file, optional fsync, then rename.
pub fn atomic_write(path: &Path, contents: &[u8], policy: IoPolicy) -> Result<(), DbError> {
    let context = path.display().to_string();
    retry_io_operation(
        || {
            let temp_path = temp_path_for(path);
            let result = write_then_rename(&temp_path, path, contents, policy.sync_writes);
            if result.is_err() {
                let _ = fs::remove_file(&temp_path);
            }
            result.map_err(|e| classify_io_error(e, &context))
        },
        policy.max_retries,
        policy.retry_delay_ms,
        "atomic_write",
    )
}

fn write_then_rename(
    temp_path: &Path,
    final_path: &Path,
    contents: &[u8],
    sync: bool,
) -> std::io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(contents)?;
    if sync {
        file.sync_all()?;
    }
    drop(file);
    fs::rename(temp_path, final_path)
}

/// Reads a file, mapping "not found" to `Ok(None)`.
pub fn read_optional(path: &Path, policy: IoPolicy) -> Result<Option<Vec<u8>>, DbError> {
    let context = path.display().to_string();
    retry_io_operation(
        || match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(classify_io_error(e, &context)),
        },
        policy.max_retries,
        policy.retry_delay_ms,
        "read",
    )
}

/// Removes a file, treating "not found" as success.
pub fn remove_if_exists(path: &Path) -> Result<bool, DbError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(classify_io_error(e, &path.display().to_string())),
    }
}

/// Creates a directory and its parents.
pub fn ensure_dir(path: &Path) -> Result<(), DbError> {
    fs::create_dir_all(path).map_err(|e| classify_io_error(e, &path.display().to_string()))
}
