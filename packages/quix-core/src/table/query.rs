//! Query-related methods for table operations.

use super::validation;
use super::Table;
use crate::error::DbError;
use crate::types::{Record, Row, RowId};

/// Projection and limit applied by [`Table::select_with`].
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Columns to return (None = all)
    pub fields: Option<Vec<String>>,
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

impl Table {
    /// Resolves the rows matching `filter`.
    ///
    /// If `filter` names a unique column, the first such column (in schema
    /// order) is looked up through its index and the remaining clauses are
    /// checked on the single candidate. Otherwise every row is scanned.
    pub(super) fn resolve(&self, filter: &Row, limit: Option<usize>) -> Result<Vec<Record>, DbError> {
        let limit = limit.unwrap_or(usize::MAX);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let indexed = self
            .schema
            .unique
            .iter()
            .find_map(|column| filter.get_key_value(column));

        if let Some((column, value)) = indexed {
            tracing::debug!("Resolving '{}' through index on '{}'", self.name, column);
            let Some(id) = self.indexes.lookup(column, value)? else {
                return Ok(Vec::new());
            };
            // a concurrent delete may have removed the row after the lookup
            return Ok(self
                .rows
                .try_get(&id)?
                .filter(|record| record.matches(filter))
                .into_iter()
                .collect());
        }

        let mut matches = Vec::new();
        for record in self.rows.scan()? {
            let record = record?;
            if record.matches(filter) {
                matches.push(record);
                if matches.len() >= limit {
                    break;
                }
            }
        }
        Ok(matches)
    }

    /// Returns every row whose fields equal all entries of `filter`.
    ///
    /// Reads take no lock and may observe a concurrent write half applied
    /// at file granularity. An empty `filter` returns all rows.
    pub fn select(&self, filter: &Row) -> Result<Vec<Record>, DbError> {
        validation::validate_values(&self.name, &self.schema, filter)?;
        self.resolve(filter, None)
    }

    /// Returns the first matching row in lookup or scan order.
    pub fn select_one(&self, filter: &Row) -> Result<Option<Record>, DbError> {
        validation::validate_values(&self.name, &self.schema, filter)?;
        Ok(self.resolve(filter, Some(1))?.into_iter().next())
    }

    /// Like [`Table::select`], with an optional column projection and row limit.
    ///
    /// # Arguments
    /// * `filter` - Column name to value mapping for equality filters
    /// * `options` - Projection and limit
    ///
    /// # Returns
    /// `Result<Vec<Record>, DbError>` containing the matching, projected rows.
    pub fn select_with(&self, filter: &Row, options: &SelectOptions) -> Result<Vec<Record>, DbError> {
        validation::validate_values(&self.name, &self.schema, filter)?;
        if let Some(fields) = &options.fields {
            validation::validate_projection(&self.name, &self.schema, fields)?;
        }

        let mut records = self.resolve(filter, options.limit)?;
        if let Some(fields) = &options.fields {
            for record in &mut records {
                record.fields.retain(|column, _| fields.contains(column));
            }
        }
        Ok(records)
    }

    /// Counts rows matching `filter`.
    pub fn count(&self, filter: &Row) -> Result<usize, DbError> {
        Ok(self.select(filter)?.len())
    }

    /// Loads a row by id, failing with `RowNotFound`.
    pub fn get(&self, id: &RowId) -> Result<Record, DbError> {
        self.rows.get(id)
    }
}
