//! JSON <-> row conversion guided by a table schema.

use anyhow::{anyhow, bail, Context};
use quix_core::{ColumnType, Row, Schema, Value};
use serde_json::Value as Json;

/// Parses a `NAME:TYPE` column declaration.
pub fn parse_column(spec: &str) -> anyhow::Result<(String, ColumnType)> {
    let (name, ty) = spec
        .split_once(':')
        .ok_or_else(|| anyhow!("column '{}' must be NAME:TYPE", spec))?;
    let ty = ty.parse::<ColumnType>().map_err(|e| anyhow!(e))?;
    Ok((name.to_string(), ty))
}

/// Parses a JSON object into a row, coercing numbers to the declared
/// column type. Values that do not fit are passed through as-is so the
/// store reports the schema mismatch.
pub fn parse_row(schema: &Schema, json: &str) -> anyhow::Result<Row> {
    let parsed: Json = serde_json::from_str(json).with_context(|| format!("invalid JSON: {}", json))?;
    let Json::Object(map) = parsed else {
        bail!("expected a JSON object, got {}", json);
    };

    map.into_iter()
        .map(|(column, value)| {
            let value = to_value(schema.column_type(&column), &value)
                .ok_or_else(|| anyhow!("unsupported value for '{}': {}", column, value))?;
            Ok((column, value))
        })
        .collect()
}

fn to_value(declared: Option<ColumnType>, json: &Json) -> Option<Value> {
    match (declared, json) {
        (Some(ColumnType::Float), Json::Number(n)) => n.as_f64().map(Value::Float),
        (Some(ColumnType::Integer), Json::Number(n)) if n.is_i64() => n.as_i64().map(Value::Integer),
        (_, Json::Bool(b)) => Some(Value::Boolean(*b)),
        (_, Json::String(s)) => Some(Value::Text(s.clone())),
        (_, Json::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        _ => None,
    }
}
