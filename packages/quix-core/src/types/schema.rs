//! Table schema: column types plus the unique column list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::ColumnType;

/// Column declarations and unique constraints of a table.
///
/// Immutable once the table is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Column name to declared type
    pub columns: BTreeMap<String, ColumnType>,
    /// Columns whose values must be unique across rows, in declaration order
    #[serde(default)]
    pub unique: Vec<String>,
}

impl Schema {
    pub fn new<C, K, U>(columns: C, unique: U) -> Self
    where
        C: IntoIterator<Item = (K, ColumnType)>,
        K: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
            unique: unique.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns.get(column).copied()
    }

    pub fn is_unique(&self, column: &str) -> bool {
        self.unique.iter().any(|c| c == column)
    }
}
