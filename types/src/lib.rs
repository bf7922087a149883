//! Shared type definitions for aggregated queries
//!
//! This crate provides the leaf types used across the aggregated crates:
//!
//! - [`Dialect`] - Database platform family and platform key normalization
//! - [`Value`] - A database scalar (bound parameter or raw column value)
//! - [`FieldType`] - The declared type of a mapped entity field
//!
//! # Features
//!
//! - `std` - Standard library support (enabled by default)
//! - `serde` - Enable serde serialization/deserialization
//! - `chrono` - Conversions from chrono date/time types into [`Value`]

mod dialect;
mod field_type;
mod value;

pub use dialect::{Dialect, DialectParseError, platform_key};
pub use field_type::FieldType;
pub use value::Value;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{Dialect, FieldType, Value};
}
