//! Row identifiers and materialized records.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::Row;

/// System-assigned row identifier, stable for the lifetime of the row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Generates a fresh random identifier (UUID v4, 32 hex chars).
    pub fn generate() -> Self {
        RowId(Uuid::new_v4().simple().to_string())
    }

    /// Parses an identifier read back from disk or supplied by a caller.
    ///
    /// Identifiers are used as file names, so only `[A-Za-z0-9_-]` is accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.len() <= 128
            && !s.starts_with('-')
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        valid.then(|| RowId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row together with its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RowId,
    pub fields: Row,
}

impl Record {
    /// Returns the value of `column`, if the row has one.
    pub fn get(&self, column: &str) -> Option<&super::Value> {
        self.fields.get(column)
    }

    /// True when every `(column, value)` of `filter` is present and equal.
    pub fn matches(&self, filter: &Row) -> bool {
        filter
            .iter()
            .all(|(column, expected)| self.fields.get(column) == Some(expected))
    }
}
