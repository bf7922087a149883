//! Statement execution boundary
//!
//! Connections, transactions and pooling belong to the host. The host hands
//! over an [`Executor`] that runs one statement and returns rows of JSON
//! scalars; [`normalize_rows`] rejects anything else.

use std::collections::BTreeMap;

use aggregated_types::Value;

use crate::error::{AggregatedError, Result};

/// A row as returned by the execution collaborator.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A validated row: column name to scalar.
pub type RawRow = BTreeMap<String, Value>;

/// Boxed driver error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Runs one statement against the active connection.
pub trait Executor: Send + Sync {
    /// Platform name of the active connection, e.g. `"mysql"` or `"postgresql"`
    fn platform(&self) -> &str;

    /// Executes `sql` with `params` bound in placeholder order.
    fn execute(&self, sql: &str, params: &[Value]) -> core::result::Result<Vec<Row>, BoxError>;
}

/// Converts executor rows into [`RawRow`]s.
///
/// Fails on the first array or object value, naming the column.
pub fn normalize_rows(rows: Vec<Row>) -> Result<Vec<RawRow>> {
    rows.into_iter().map(normalize_row).collect()
}

fn normalize_row(row: Row) -> Result<RawRow> {
    row.into_iter()
        .map(|(column, value)| {
            let value = scalar_from_json(value).ok_or_else(|| {
                AggregatedError::hydration(format!(
                    "Unsupported value type returned for column \"{column}\""
                ))
            })?;
            Ok((column, value))
        })
        .collect()
}

/// JSON scalar to [`Value`]; `None` for arrays and objects.
pub(crate) fn scalar_from_json(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(b)),
        serde_json::Value::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        serde_json::Value::String(s) => Some(Value::Text(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

/// [`Value`] to JSON; non-finite floats become `null`.
pub(crate) fn scalar_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Int(i) => serde_json::Value::from(i),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s),
    }
}
