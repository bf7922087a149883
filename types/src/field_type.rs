//! Declared field types of mapped entities.

/// The type tag the metadata oracle reports for an entity field.
///
/// The typed-object hydrator converts raw scalars according to this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    DateTime,
    Date,
    Time,
    /// Comma-delimited list of strings stored in one column
    SimpleArray,
    /// JSON document passed through as decoded JSON
    Json,
    #[default]
    String,
}

impl FieldType {
    /// Parse a mapping type name (case-insensitive).
    ///
    /// Unrecognized names map to [`FieldType::String`].
    ///
    /// ```
    /// use aggregated_types::FieldType;
    ///
    /// assert_eq!(FieldType::parse("bigint"), FieldType::Integer);
    /// assert_eq!(FieldType::parse("datetime_immutable"), FieldType::DateTime);
    /// assert_eq!(FieldType::parse("decimal"), FieldType::String);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "smallint" | "bigint" => FieldType::Integer,
            "float" | "double" | "real" => FieldType::Float,
            "boolean" | "bool" => FieldType::Boolean,
            "datetime" | "datetime_immutable" | "datetimetz" | "datetimetz_immutable"
            | "timestamp" | "timestamptz" => FieldType::DateTime,
            "date" | "date_immutable" => FieldType::Date,
            "time" | "time_immutable" => FieldType::Time,
            "simple_array" => FieldType::SimpleArray,
            "json" | "json_array" | "jsonb" => FieldType::Json,
            _ => FieldType::String,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::SimpleArray => "simple_array",
            FieldType::Json => "json",
            FieldType::String => "string",
        }
    }
}

impl core::fmt::Display for FieldType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
