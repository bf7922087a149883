//! Identifier safety checks
//!
//! Table and column names are interpolated into SQL text, while values are
//! always bound. Every resolved name passes through [`validate_identifier`]
//! before it reaches a generator.

use crate::error::{AggregatedError, Result};

/// Returns `true` for `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_safe_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Fails with `InvalidConfiguration` unless `ident` is a safe identifier.
///
/// `label` names what the identifier is (e.g. "column", "table") in the error.
pub fn validate_identifier(ident: &str, label: &str) -> Result<()> {
    if is_safe_identifier(ident) {
        Ok(())
    } else {
        Err(AggregatedError::invalid(format!("Invalid {label} name \"{ident}\"")))
    }
}

/// Trims `name` and fails if nothing remains.
pub(crate) fn require_name<'a>(name: &'a str, label: &str) -> Result<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AggregatedError::invalid(format!("{label} name cannot be empty")));
    }
    Ok(name)
}
