//! Decoding of embedded JSON relation payloads.

use aggregated_types::Value;

use crate::error::{AggregatedError, Result};
use crate::generator::COUNT_SUFFIX;

/// A decoded flat JSON object.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

fn parse_payload(relation: &str, raw: &Value) -> Result<Option<serde_json::Value>> {
    let text = match raw {
        Value::Null => return Ok(None),
        Value::Text(text) => text,
        other => {
            return Err(AggregatedError::hydration(format!(
                "Expected JSON string for relation \"{relation}\", got {}",
                other.type_name()
            )));
        }
    };

    let decoded: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        AggregatedError::hydration(format!("Invalid JSON for relation \"{relation}\": {e}"))
    })?;

    Ok((!decoded.is_null()).then_some(decoded))
}

fn ensure_flat(relation: &str, object: &JsonObject) -> Result<()> {
    if object.values().any(|v| v.is_array() || v.is_object()) {
        return Err(AggregatedError::hydration(format!(
            "Decoded JSON object for relation \"{relation}\" must be flat"
        )));
    }
    Ok(())
}

/// Decodes a single-relation payload. `NULL` and JSON `null` give `None`.
pub fn decode_object(relation: &str, raw: &Value) -> Result<Option<JsonObject>> {
    match parse_payload(relation, raw)? {
        None => Ok(None),
        Some(serde_json::Value::Object(object)) => {
            ensure_flat(relation, &object)?;
            Ok(Some(object))
        }
        Some(_) => Err(AggregatedError::hydration(format!(
            "Decoded JSON for relation \"{relation}\" must be an object or null"
        ))),
    }
}

/// Decodes a collection payload. `NULL` and JSON `null` give an empty list.
pub fn decode_array(relation: &str, raw: &Value) -> Result<Vec<JsonObject>> {
    let items = match parse_payload(relation, raw)? {
        None => return Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => {
            return Err(AggregatedError::hydration(format!(
                "Decoded JSON for relation \"{relation}\" must be a list or null"
            )));
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::Object(object) => {
                ensure_flat(relation, &object)?;
                Ok(object)
            }
            _ => Err(AggregatedError::hydration(format!(
                "Decoded JSON array for relation \"{relation}\" must contain objects"
            ))),
        })
        .collect()
}

/// Digit-only text, as drivers return `COUNT(*)` results.
pub(crate) fn parse_count(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Rewrites `*_count` values holding digit-only strings into integers.
pub fn coerce_counts(row: &mut JsonObject) {
    for (key, value) in row.iter_mut() {
        if !key.ends_with(COUNT_SUFFIX) {
            continue;
        }
        if let Some(count) = value.as_str().and_then(parse_count) {
            *value = serde_json::Value::from(count);
        }
    }
}
