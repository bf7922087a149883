use std::collections::BTreeMap;

use aggregated_types::{FieldType, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::json::{JsonObject, decode_array, decode_object, parse_count};
use super::Hydrator;
use crate::error::{AggregatedError, Result};
use crate::executor::{RawRow, scalar_from_json, scalar_to_json};
use crate::generator::COUNT_SUFFIX;
use crate::metadata::MetadataResolver;
use crate::query::{LoadMethod, RelationSet};

/// A converted field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    /// `simple_array` column
    List(Vec<String>),
    /// Decoded JSON document
    Json(serde_json::Value),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// A loaded relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Box<Entity>>),
    Many(Vec<Entity>),
}

/// A typed entity instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub entity_type: String,
    /// Keyed by field name
    pub fields: BTreeMap<String, FieldValue>,
    pub relations: BTreeMap<String, Related>,
    /// Keyed by count name, without the `_count` suffix
    pub counts: BTreeMap<String, i64>,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Loaded to-one relation, `None` when absent or null
    pub fn one(&self, relation: &str) -> Option<&Entity> {
        match self.relations.get(relation)? {
            Related::One(entity) => entity.as_deref(),
            Related::Many(_) => None,
        }
    }

    /// Loaded collection, `None` when not loaded
    pub fn many(&self, relation: &str) -> Option<&[Entity]> {
        match self.relations.get(relation)? {
            Related::Many(entities) => Some(entities),
            Related::One(_) => None,
        }
    }

    pub fn count(&self, name: &str) -> Option<i64> {
        self.counts.get(name).copied()
    }
}

/// Typed-object strategy.
///
/// Root and related fields are converted according to their declared
/// [`FieldType`]; relations become nested [`Entity`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityHydrator;

impl Hydrator for EntityHydrator {
    type Output = Entity;

    fn name(&self) -> &'static str {
        "entity"
    }

    fn hydrate(
        &self,
        rows: Vec<RawRow>,
        entity: &str,
        relations: &RelationSet,
        metadata: &MetadataResolver,
    ) -> Result<Vec<Entity>> {
        let fields = metadata.field_columns(entity)?;

        rows.into_iter()
            .map(|row| {
                let mut out = Entity::new(entity);
                for (field, column, ty) in &fields {
                    if let Some(value) = row.get(column) {
                        out.fields.insert(field.clone(), convert_field(*ty, value)?);
                    }
                }

                for config in relations {
                    let Some(raw) = row.get(&config.name) else {
                        continue;
                    };
                    let related = match config.method {
                        LoadMethod::SingleObject => Related::One(
                            hydrate_related(&config.target, decode_object(&config.name, raw)?, metadata)?
                                .map(Box::new),
                        ),
                        LoadMethod::Collection => Related::Many(
                            decode_array(&config.name, raw)?
                                .into_iter()
                                .map(|item| hydrate_related(&config.target, Some(item), metadata))
                                .filter_map(Result::transpose)
                                .collect::<Result<_>>()?,
                        ),
                        LoadMethod::Count => continue,
                    };
                    out.relations.insert(config.name.clone(), related);
                }

                for (key, value) in &row {
                    let Some(name) = key.strip_suffix(COUNT_SUFFIX) else {
                        continue;
                    };
                    if fields.iter().any(|(_, column, _)| column == key) {
                        continue;
                    }
                    let count = match value {
                        Value::Int(n) => Some(*n),
                        Value::Text(s) => parse_count(s),
                        _ => None,
                    };
                    if let Some(count) = count {
                        out.counts.insert(name.to_string(), count);
                    }
                }

                Ok(out)
            })
            .collect()
    }
}

fn hydrate_related(
    target: &str,
    data: Option<JsonObject>,
    metadata: &MetadataResolver,
) -> Result<Option<Entity>> {
    let data = match data {
        Some(data) if !data.is_empty() => data,
        _ => return Ok(None),
    };

    let mut entity = Entity::new(target);
    for (field, column, ty) in metadata.field_columns(target)? {
        let Some(value) = data.get(&column) else {
            continue;
        };
        let value = scalar_from_json(value.clone()).ok_or_else(|| {
            AggregatedError::hydration(format!("Nested value for \"{target}.{field}\""))
        })?;
        entity.fields.insert(field, convert_field(ty, &value)?);
    }
    Ok(Some(entity))
}

/// Converts a raw scalar into the declared field type.
pub(crate) fn convert_field(ty: FieldType, value: &Value) -> Result<FieldValue> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }

    Ok(match ty {
        FieldType::Boolean => FieldValue::Bool(to_bool(value)),
        FieldType::Integer => FieldValue::Int(to_int(value)?),
        FieldType::Float => FieldValue::Float(to_float(value)?),
        FieldType::Json => FieldValue::Json(match value {
            Value::Text(text) if text.trim().is_empty() => serde_json::Value::Null,
            Value::Text(text) => serde_json::from_str(text)
                .map_err(|e| AggregatedError::hydration(format!("Invalid JSON value: {e}")))?,
            other => scalar_to_json(other.clone()),
        }),
        FieldType::SimpleArray => FieldValue::List(
            value
                .to_string()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        FieldType::DateTime => FieldValue::DateTime(parse_datetime(&value.to_string())?),
        FieldType::Date => FieldValue::Date(parse_date(&value.to_string())?),
        FieldType::Time => FieldValue::Time(parse_time(&value.to_string())?),
        FieldType::String => FieldValue::Text(match value {
            Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
            other => other.to_string(),
        }),
    })
}

/// Truthiness of a raw scalar.
///
/// Text is truthy for `1`, `true`, `t`, `yes`, `y` and `on` (any case);
/// everything else is false.
#[must_use]
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "t" | "yes" | "y" | "on"
        ),
    }
}

fn to_int(value: &Value) -> Result<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(x) => Ok(*x as i64),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|x| x as i64))
                .map_err(|_| AggregatedError::hydration(format!("Invalid integer value \"{s}\"")))
        }
        Value::Null => Ok(0),
    }
}

fn to_float(value: &Value) -> Result<f64> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AggregatedError::hydration(format!("Invalid float value \"{s}\""))),
        Value::Null => Ok(0.0),
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

fn invalid_datetime(value: &str) -> AggregatedError {
    AggregatedError::hydration(format!("Invalid datetime value \"{value}\""))
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| invalid_datetime(value))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map_or_else(|| parse_datetime(trimmed).map(|dt| dt.date()), Ok)
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| invalid_datetime(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AssociationMapping, EntityDef, InMemoryMetadata, RelationKind};
    use crate::query::RelationConfig;
    use std::sync::Arc;

    #[test]
    fn test_to_bool_forms() {
        for truthy in ["1", "true", "T", "yes", "Y", "on", " ON "] {
            assert!(to_bool(&Value::from(truthy)), "{truthy} should be true");
        }
        for falsy in ["0", "false", "f", "no", "n", "off", "", "maybe"] {
            assert!(!to_bool(&Value::from(falsy)), "{falsy} should be false");
        }
        assert!(to_bool(&Value::Int(2)));
        assert!(!to_bool(&Value::Int(0)));
        assert!(!to_bool(&Value::Float(0.0)));
    }

    #[test]
    fn test_convert_field() {
        assert_eq!(convert_field(FieldType::Integer, &"42".into()).unwrap(), FieldValue::Int(42));
        assert_eq!(convert_field(FieldType::Float, &"1.5".into()).unwrap(), FieldValue::Float(1.5));
        assert_eq!(convert_field(FieldType::Integer, &Value::Null).unwrap(), FieldValue::Null);
        assert_eq!(
            convert_field(FieldType::SimpleArray, &"a, b,,c ".into()).unwrap(),
            FieldValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(
            convert_field(FieldType::Json, &r#"{"k":[1,2]}"#.into()).unwrap(),
            FieldValue::Json(serde_json::json!({"k": [1, 2]}))
        );
        assert_eq!(convert_field(FieldType::String, &Value::Bool(true)).unwrap(), FieldValue::Text("1".into()));
        assert_eq!(convert_field(FieldType::String, &Value::Int(7)).unwrap(), FieldValue::Text("7".into()));

        let dt = convert_field(FieldType::DateTime, &"2024-03-01 12:30:00".into()).unwrap();
        assert_eq!(
            dt.as_datetime().unwrap().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-03-01 12:30:00"
        );
        assert!(convert_field(FieldType::DateTime, &"2024-03-01T12:30:00+02:00".into()).is_ok());
        assert_eq!(
            convert_field(FieldType::Date, &"2024-03-01".into()).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(convert_field(FieldType::DateTime, &"yesterday-ish".into()).is_err());
        assert!(convert_field(FieldType::Integer, &"abc".into()).is_err());
    }

    #[test]
    fn test_hydrate_graph() {
        let meta = InMemoryMetadata::new()
            .entity(
                EntityDef::new("Partner", "partners")
                    .id("id")
                    .field("active", FieldType::Boolean)
                    .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id"))
                    .association("promocodes", AssociationMapping::one_to_many("Promocode", "partner")),
            )
            .entity(EntityDef::new("Profile", "profiles").id("id").field("name", FieldType::String))
            .entity(EntityDef::new("Promocode", "promocodes").id("id").field("code", FieldType::String));
        let metadata = MetadataResolver::new(Arc::new(meta));

        let config = |name: &str, target: &str, kind, method| RelationConfig {
            name: name.into(),
            kind,
            target: target.into(),
            method,
            columns: vec!["id".into()],
            base_column: "id".into(),
            related_column: "id".into(),
        };
        let relations: RelationSet = [
            config("profile", "Profile", RelationKind::ManyToOne, LoadMethod::SingleObject),
            config("promocodes", "Promocode", RelationKind::OneToMany, LoadMethod::Collection),
        ]
        .into_iter()
        .collect();

        let rows = vec![
            [
                ("id".to_string(), Value::from("1")),
                ("active".to_string(), Value::from("yes")),
                ("profile".to_string(), Value::from(r#"{"id":10,"name":"John"}"#)),
                ("promocodes".to_string(), Value::from(r#"[{"id":1,"code":"A"},{}]"#)),
                ("promocodes_count".to_string(), Value::from("2")),
            ]
            .into_iter()
            .collect(),
            [
                ("id".to_string(), Value::Int(2)),
                ("profile".to_string(), Value::from("{}")),
                ("promocodes".to_string(), Value::Null),
            ]
            .into_iter()
            .collect(),
        ];

        let out = EntityHydrator.hydrate(rows, "Partner", &relations, &metadata).unwrap();

        assert_eq!(out[0].get("id"), Some(&FieldValue::Int(1)));
        assert_eq!(out[0].get("active"), Some(&FieldValue::Bool(true)));
        let profile = out[0].one("profile").unwrap();
        assert_eq!(profile.entity_type, "Profile");
        assert_eq!(profile.get("name").and_then(FieldValue::as_str), Some("John"));
        assert_eq!(out[0].many("promocodes").unwrap().len(), 1);
        assert_eq!(out[0].count("promocodes"), Some(2));

        assert!(out[1].one("profile").is_none());
        assert!(matches!(out[1].relations.get("profile"), Some(Related::One(None))));
        assert_eq!(out[1].many("promocodes"), Some(&[][..]));
    }
}
