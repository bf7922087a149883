use super::json::{coerce_counts, decode_array, decode_object};
use super::{Hydrator, JsonObject};
use crate::error::Result;
use crate::executor::{RawRow, scalar_to_json};
use crate::metadata::MetadataResolver;
use crate::query::{LoadMethod, RelationSet};

/// A hydrated row: root columns, decoded relations and integer counts.
pub type HydratedRow = JsonObject;

/// Flat-mapping strategy.
///
/// Single relations become an object or `null`, collections a list (never
/// `null`), digit-only `*_count` strings become integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayHydrator;

impl ArrayHydrator {
    pub(crate) fn hydrate_row(row: RawRow, relations: &RelationSet) -> Result<HydratedRow> {
        let mut out = JsonObject::new();

        for (key, value) in row {
            let decoded = match relations.get(&key) {
                Some(config) if config.method == LoadMethod::SingleObject => {
                    decode_object(&key, &value)?.map_or(serde_json::Value::Null, serde_json::Value::Object)
                }
                Some(config) if config.method == LoadMethod::Collection => serde_json::Value::Array(
                    decode_array(&key, &value)?
                        .into_iter()
                        .map(serde_json::Value::Object)
                        .collect(),
                ),
                _ => scalar_to_json(value),
            };
            out.insert(key, decoded);
        }

        coerce_counts(&mut out);
        Ok(out)
    }
}

impl Hydrator for ArrayHydrator {
    type Output = HydratedRow;

    fn name(&self) -> &'static str {
        "array"
    }

    fn hydrate(
        &self,
        rows: Vec<RawRow>,
        _entity: &str,
        relations: &RelationSet,
        _metadata: &MetadataResolver,
    ) -> Result<Vec<HydratedRow>> {
        rows.into_iter()
            .map(|row| Self::hydrate_row(row, relations))
            .collect()
    }
}
