//! Per-table advisory lock serializing mutating operations across threads
//! and processes.
//!
//! The lock is a marker file `<table>/<table>.lock` created with exclusive
//! create semantics. Whoever creates it holds the lock until the returned
//! [`TableLock`] is released or dropped.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::storage::io_utils::{classify_io_error, remove_if_exists};

/// Contents of a lock marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMarker {
    /// Process id of the holder
    pub pid: u32,
    /// Acquisition time in milliseconds since the Unix epoch
    pub acquired_at_ms: u64,
}

impl LockMarker {
    fn current() -> Self {
        let acquired_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            pid: std::process::id(),
            acquired_at_ms,
        }
    }
}

/// Acquires table locks with fixed-interval retry and an optional timeout.
#[derive(Debug, Clone)]
pub struct LockManager {
    retry_interval: Duration,
    timeout: Option<Duration>,
    stale_after: Option<Duration>,
}

impl LockManager {
    pub fn new(config: &DbConfig) -> Self {
        Self {
            retry_interval: Duration::from_millis(config.lock_retry_interval_ms.max(1)),
            timeout: config.lock_timeout(),
            stale_after: config.stale_lock_ms.map(Duration::from_millis),
        }
    }

    /// Path of the lock marker for `table`.
    pub fn lock_path(table_dir: &Path, table: &str) -> PathBuf {
        table_dir.join(format!("{}.lock", table))
    }

    /// Reads the marker of the current holder, if any.
    pub fn holder(table_dir: &Path, table: &str) -> Option<LockMarker> {
        let bytes = fs::read(Self::lock_path(table_dir, table)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Blocks until the lock for `table` is free, then takes it.
    ///
    /// Fails with `LockTimeout` once the configured timeout elapses.
    pub fn acquire(&self, table_dir: &Path, table: &str) -> Result<TableLock, DbError> {
        let path = Self::lock_path(table_dir, table);
        let started = Instant::now();
        let mut contended = false;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let marker = LockMarker::current();
                    let written = serde_json::to_vec(&marker)
                        .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
                        .and_then(|json| file.write_all(&json));
                    if let Err(e) = written {
                        let _ = fs::remove_file(&path);
                        return Err(classify_io_error(e, &path.display().to_string()));
                    }
                    tracing::debug!(
                        "Acquired lock on table '{}' after {:?}",
                        table,
                        started.elapsed()
                    );
                    return Ok(TableLock {
                        table: table.to_string(),
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !contended {
                        contended = true;
                        tracing::debug!(
                            "Lock on table '{}' held by {:?}, waiting",
                            table,
                            Self::holder(table_dir, table)
                        );
                    }

                    if self.reclaim_if_stale(&path, table)? {
                        continue;
                    }

                    if let Some(timeout) = self.timeout {
                        if started.elapsed() >= timeout {
                            return Err(DbError::LockTimeout {
                                table: table.to_string(),
                                waited_ms: started.elapsed().as_millis() as u64,
                                holder: Self::holder(table_dir, table)
                                    .map(|m| format!("pid {}", m.pid)),
                            });
                        }
                    }

                    std::thread::sleep(self.retry_interval);
                }
                Err(e) => return Err(classify_io_error(e, &path.display().to_string())),
            }
        }
    }

    /// Removes a marker older than the stale threshold. Best effort: two
    /// waiters may both decide to reclaim the same marker.
    fn reclaim_if_stale(&self, path: &Path, table: &str) -> Result<bool, DbError> {
        let Some(stale_after) = self.stale_after else {
            return Ok(false);
        };
        let age = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified.elapsed().unwrap_or_default(),
            // released between our attempt and now
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(classify_io_error(e, &path.display().to_string())),
        };
        if age < stale_after {
            return Ok(false);
        }

        tracing::warn!(
            "Reclaiming stale lock on table '{}' (age {:?}, holder {:?})",
            table,
            age,
            fs::read_to_string(path).ok()
        );
        remove_if_exists(path)?;
        Ok(true)
    }
}

/// Held table lock. Released on [`TableLock::release`] or drop.
#[derive(Debug)]
pub struct TableLock {
    table: String,
    path: PathBuf,
    released: bool,
}

impl TableLock {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Removes the marker, reporting I/O failures.
    pub fn release(mut self) -> Result<(), DbError> {
        self.released = true;
        remove_if_exists(&self.path)?;
        tracing::debug!("Released lock on table '{}'", self.table);
        Ok(())
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_if_exists(&self.path) {
            tracing::error!("Failed to release lock on table '{}': {}", self.table, e);
        }
    }
}
