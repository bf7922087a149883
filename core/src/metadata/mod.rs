//! Entity metadata
//!
//! The metadata store is an external, read-only collaborator. It is modelled
//! by [`MetadataOracle`] and queried through [`MetadataResolver`], which turns
//! raw association mappings into validated join information.

mod memory;
mod resolver;

pub use memory::{EntityDef, InMemoryMetadata};
pub use resolver::MetadataResolver;

use aggregated_types::FieldType;

/// Cardinality of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-one: `Partner` has one `Profile`.
    OneToOne,
    /// Many-to-one: many `Partner`s belong to one `Country`.
    ManyToOne,
    /// One-to-many: one `Partner` has many `Promocode`s.
    OneToMany,
    /// Many-to-many through a link table. Never loadable.
    ManyToMany,
}

impl RelationKind {
    /// `true` for kinds that load as a single JSON object.
    #[must_use]
    pub const fn is_to_one(self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "OneToOne",
            Self::ManyToOne => "ManyToOne",
            Self::OneToMany => "OneToMany",
            Self::ManyToMany => "ManyToMany",
        }
    }
}

impl core::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One join column of an owning-side association.
///
/// `name` lives on the owning table, `referenced_column_name` on the target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinColumn {
    pub name: Option<String>,
    pub referenced_column_name: Option<String>,
}

impl JoinColumn {
    pub fn new(name: impl Into<String>, referenced_column_name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            referenced_column_name: Some(referenced_column_name.into()),
        }
    }
}

/// Association as reported by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMapping {
    pub kind: RelationKind,
    pub target: String,
    pub join_columns: Vec<JoinColumn>,
    /// Name of the owning association on `target` (inverse side only)
    pub mapped_by: Option<String>,
}

impl AssociationMapping {
    /// Owning-side many-to-one through `join_column` -> `referenced`.
    pub fn many_to_one(
        target: impl Into<String>,
        join_column: impl Into<String>,
        referenced: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::ManyToOne,
            target: target.into(),
            join_columns: vec![JoinColumn::new(join_column, referenced)],
            mapped_by: None,
        }
    }

    /// Owning-side one-to-one through `join_column` -> `referenced`.
    pub fn one_to_one(
        target: impl Into<String>,
        join_column: impl Into<String>,
        referenced: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::OneToOne,
            ..Self::many_to_one(target, join_column, referenced)
        }
    }

    /// Inverse-side one-to-many, resolved through `mapped_by` on the target.
    pub fn one_to_many(target: impl Into<String>, mapped_by: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::OneToMany,
            target: target.into(),
            join_columns: Vec::new(),
            mapped_by: Some(mapped_by.into()),
        }
    }

    pub fn many_to_many(target: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::ManyToMany,
            target: target.into(),
            join_columns: Vec::new(),
            mapped_by: None,
        }
    }

    /// Sets `mapped_by`, e.g. for an inverse-side one-to-one.
    #[must_use]
    pub fn mapped_by(mut self, field: impl Into<String>) -> Self {
        self.mapped_by = Some(field.into());
        self
    }
}

/// Resolved join information for one relation.
///
/// The join condition is always `<related alias>.related_column = e.base_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMetadata {
    pub kind: RelationKind,
    pub target: String,
    /// Column on the root table
    pub base_column: String,
    /// Column on the target table
    pub related_column: String,
}

/// Read-only access to the entity/relationship metadata store.
///
/// `None` means "not mapped"; the resolver turns that into the matching
/// error kind. Implementations must not panic on unknown names.
pub trait MetadataOracle: Send + Sync {
    /// Table name, `None` if the entity is not mapped
    fn entity_table(&self, entity: &str) -> Option<String>;

    /// Identifier field names
    fn identifier_fields(&self, entity: &str) -> Option<Vec<String>>;

    /// Identifier column names, never empty for a mapped entity
    fn identifier_columns(&self, entity: &str) -> Option<Vec<String>>;

    /// Scalar (non-association) field names in declaration order
    fn field_names(&self, entity: &str) -> Option<Vec<String>>;

    fn field_column(&self, entity: &str, field: &str) -> Option<String>;

    fn field_type(&self, entity: &str, field: &str) -> Option<FieldType>;

    fn has_association(&self, entity: &str, name: &str) -> bool;

    fn association_mapping(&self, entity: &str, name: &str) -> Option<AssociationMapping>;

    /// Association names in declaration order
    fn association_names(&self, entity: &str) -> Vec<String>;
}
