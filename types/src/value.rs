//! Database scalar values.
//!
//! A [`Value`] is what crosses the boundary to the execution collaborator:
//! bound filter parameters on the way out, raw column values on the way back.

use core::fmt;

/// A database scalar: boolean, integer, float, string or NULL.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Builds a text value from anything printable.
    ///
    /// This is the canonical form for string-convertible filter values.
    pub fn display(value: impl fmt::Display) -> Self {
        Value::Text(value.to_string())
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use super::Value;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

    /// Canonical textual form for date-time filter values.
    pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    impl From<NaiveDateTime> for Value {
        fn from(v: NaiveDateTime) -> Self {
            Value::Text(v.format(DATETIME_FORMAT).to_string())
        }
    }

    impl<Tz: TimeZone> From<DateTime<Tz>> for Value
    where
        Tz::Offset: core::fmt::Display,
    {
        fn from(v: DateTime<Tz>) -> Self {
            Value::Text(v.format(DATETIME_FORMAT).to_string())
        }
    }

    impl From<NaiveDate> for Value {
        fn from(v: NaiveDate) -> Self {
            Value::Text(v.format("%Y-%m-%d").to_string())
        }
    }

    impl From<NaiveTime> for Value {
        fn from(v: NaiveTime) -> Self {
            Value::Text(v.format("%H:%M:%S").to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("active"), Value::Text("active".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(2.5f64)), Value::Float(2.5));
    }

    #[test]
    fn test_display_helper() {
        struct Code(u16);
        impl fmt::Display for Code {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "PROMO-{}", self.0)
            }
        }

        assert_eq!(Value::display(Code(7)), Value::Text("PROMO-7".into()));
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_datetime_normalization() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap();
        assert_eq!(Value::from(dt), Value::Text("2024-03-09 14:05:00".into()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_untagged() {
        let values = vec![Value::Text("a".into()), Value::Int(5), Value::Null];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"["a",5,null]"#);
    }
}
