//! Database configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Root directory holding one subdirectory per table
    pub data_dir: PathBuf,
    /// Maximum wait for a table lock in milliseconds (0 = wait forever)
    pub lock_timeout_ms: u64,
    /// Delay between lock acquisition attempts in milliseconds
    pub lock_retry_interval_ms: u64,
    /// Age after which a lock marker is considered abandoned (None = never)
    pub stale_lock_ms: Option<u64>,
    /// Fsync temporary files before renaming them into place
    pub sync_writes: bool,
    /// Maximum retry attempts for transient I/O errors
    pub io_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub io_retry_delay_ms: u64,
}

impl DbConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub(crate) fn lock_timeout(&self) -> Option<Duration> {
        match self.lock_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            lock_timeout_ms: 5000,
            lock_retry_interval_ms: 10,
            stale_lock_ms: None,
            sync_writes: true,
            io_max_retries: 3,
            io_retry_delay_ms: 100,
        }
    }
}
