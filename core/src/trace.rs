//! Tracing utilities for query observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// aggregated_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! aggregated_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "aggregated.query");
    };
}

/// Emit a debug-level tracing event after a hydration batch.
///
/// ```ignore
/// aggregated_trace_hydrate!("array", rows.len());
/// ```
#[macro_export]
macro_rules! aggregated_trace_hydrate {
    ($strategy:expr, $rows:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(strategy = $strategy, rows = $rows, "aggregated.hydrate");
    };
}

/// Emit a warn-level tracing event when no generator matches the platform.
#[macro_export]
macro_rules! aggregated_trace_unsupported {
    ($platform:expr) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(platform = %$platform, "aggregated.unsupported_platform");
    };
}
