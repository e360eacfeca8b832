//! Embedded file-backed table store.
//!
//! Each table is a directory, each row a record file, and unique columns
//! are enforced through fingerprint-keyed index files. Mutations are
//! serialized per table by a lock file, so several processes may share
//! one database directory.

pub mod config;
pub mod database;
pub mod error;
pub mod hashing;
pub mod lock;
pub mod storage;
pub mod table;
pub mod types;

pub use config::DbConfig;
pub use database::{connect, Database};
pub use error::DbError;
pub use table::{SelectOptions, Table};
pub use types::{ColumnType, Record, Row, RowId, Schema, Value};
