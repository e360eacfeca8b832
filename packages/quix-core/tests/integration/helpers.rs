//! Shared fixtures for integration tests.

use quix_core::{connect, ColumnType, Database};
use tempfile::TempDir;

/// Creates a database with the `users` table
/// `{Email: text, Name: text, Password: text}`, unique `[Email]`.
pub fn users_db() -> anyhow::Result<(TempDir, Database)> {
    let dir = tempfile::tempdir()?;
    let db = connect(dir.path())?;
    db.create_table(
        "users",
        &[
            ("Email", ColumnType::Text),
            ("Name", ColumnType::Text),
            ("Password", ColumnType::Text),
        ],
        &["Email"],
    )?;
    Ok((dir, db))
}

/// Number of entries in a table subdirectory.
pub fn entries(dir: &TempDir, table: &str, sub: &str) -> usize {
    std::fs::read_dir(dir.path().join(table).join(sub))
        .map(|entries| entries.count())
        .unwrap_or(0)
}
