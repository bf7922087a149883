//! Result hydration
//!
//! Raw rows hold scalars only; relation columns carry JSON text. A
//! [`Hydrator`] decodes those payloads and shapes each row:
//!
//! - [`ArrayHydrator`] - flat JSON maps with nested relation maps/lists
//! - [`EntityHydrator`] - typed [`Entity`] graphs driven by field metadata
//! - [`DtoHydrator`] - any `serde::Deserialize` projection type

mod array;
mod dto;
mod entity;
mod json;

pub use array::{ArrayHydrator, HydratedRow};
pub use dto::DtoHydrator;
pub use entity::{Entity, EntityHydrator, FieldValue, Related, to_bool};
pub use json::{JsonObject, coerce_counts, decode_array, decode_object};

use crate::error::Result;
use crate::executor::RawRow;
use crate::metadata::MetadataResolver;
use crate::query::RelationSet;

/// One hydration strategy.
///
/// A batch either hydrates completely or fails; no partial output.
pub trait Hydrator {
    type Output;

    /// Strategy name used in logs
    fn name(&self) -> &'static str;

    fn hydrate(
        &self,
        rows: Vec<RawRow>,
        entity: &str,
        relations: &RelationSet,
        metadata: &MetadataResolver,
    ) -> Result<Vec<Self::Output>>;
}

impl<H: Hydrator + ?Sized> Hydrator for &H {
    type Output = H::Output;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn hydrate(
        &self,
        rows: Vec<RawRow>,
        entity: &str,
        relations: &RelationSet,
        metadata: &MetadataResolver,
    ) -> Result<Vec<Self::Output>> {
        (**self).hydrate(rows, entity, relations, metadata)
    }
}

/// Strategies selectable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HydratorKind {
    #[default]
    Array,
    Entity,
}

impl HydratorKind {
    pub const ALL: [&'static str; 2] = ["array", "entity"];

    /// Case-insensitive `array` / `entity`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("array") {
            Some(Self::Array)
        } else if name.eq_ignore_ascii_case("entity") {
            Some(Self::Entity)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Entity => "entity",
        }
    }

    /// Runs the selected strategy.
    pub fn hydrate(
        self,
        rows: Vec<RawRow>,
        entity: &str,
        relations: &RelationSet,
        metadata: &MetadataResolver,
    ) -> Result<Vec<Hydrated>> {
        Ok(match self {
            Self::Array => ArrayHydrator
                .hydrate(rows, entity, relations, metadata)?
                .into_iter()
                .map(Hydrated::Row)
                .collect(),
            Self::Entity => EntityHydrator
                .hydrate(rows, entity, relations, metadata)?
                .into_iter()
                .map(Hydrated::Entity)
                .collect(),
        })
    }
}

impl core::fmt::Display for HydratorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a configuration-selected strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated {
    Row(HydratedRow),
    Entity(Entity),
}

impl Hydrated {
    pub fn as_row(&self) -> Option<&HydratedRow> {
        match self {
            Self::Row(row) => Some(row),
            Self::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Row(_) => None,
        }
    }

    pub fn into_row(self) -> Option<HydratedRow> {
        match self {
            Self::Row(row) => Some(row),
            Self::Entity(_) => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Row(_) => None,
        }
    }
}
