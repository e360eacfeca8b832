//! Validation of names, schemas and row values.

use crate::error::DbError;
use crate::types::{Row, Schema, Value};

/// Validates a table or column name.
///
/// Names become path components, so only `[A-Za-z0-9_-]` is allowed and the
/// first character may not be `-`.
pub(crate) fn validate_name(kind: &'static str, name: &str) -> Result<(), DbError> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && !name.starts_with('-')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Validates a schema before it is persisted.
///
/// # Arguments
/// * `table` - Table name, for error context
/// * `schema` - Schema to check
///
/// # Returns
/// `Result<(), DbError>` indicating success or validation failure.
pub(crate) fn validate_schema(table: &str, schema: &Schema) -> Result<(), DbError> {
    if schema.columns.is_empty() {
        return Err(DbError::schema(table, "a table needs at least one column"));
    }
    for column in schema.columns.keys() {
        validate_name("column", column)?;
    }

    let mut seen = std::collections::HashSet::new();
    for column in &schema.unique {
        if !schema.columns.contains_key(column) {
            return Err(DbError::schema(
                table,
                format!("unique column '{}' is not a declared column", column),
            ));
        }
        if !seen.insert(column) {
            return Err(DbError::schema(
                table,
                format!("unique column '{}' listed twice", column),
            ));
        }
    }
    Ok(())
}

/// Validates that every value in `values` names a declared column and
/// carries that column's type.
///
/// # Arguments
/// * `table` - Table name, for error context
/// * `schema` - Table schema
/// * `values` - Row data or equality filter
///
/// # Returns
/// `Result<(), DbError>` indicating success or `SchemaMismatch`.
pub(crate) fn validate_values(table: &str, schema: &Schema, values: &Row) -> Result<(), DbError> {
    for (column, value) in values {
        let Some(expected) = schema.column_type(column) else {
            return Err(DbError::schema(table, format!("unknown column '{}'", column)));
        };
        if value.column_type() != expected {
            return Err(DbError::schema(
                table,
                format!(
                    "column '{}' expects {}, got {} {}",
                    column,
                    expected,
                    value.column_type(),
                    value
                ),
            ));
        }
        if let Value::Float(x) = value {
            if !x.is_finite() {
                return Err(DbError::schema(
                    table,
                    format!("column '{}' does not accept non-finite float {}", column, x),
                ));
            }
        }
    }
    Ok(())
}

/// Validates projected column names.
pub(crate) fn validate_projection(
    table: &str,
    schema: &Schema,
    fields: &[String],
) -> Result<(), DbError> {
    match fields.iter().find(|f| !schema.columns.contains_key(*f)) {
        Some(unknown) => Err(DbError::schema(
            table,
            format!("unknown column '{}' in projection", unknown),
        )),
        None => Ok(()),
    }
}
