use std::sync::Arc;

use aggregated_types::FieldType;

use super::{AssociationMapping, MetadataOracle, RelationKind, RelationMetadata};
use crate::error::{AggregatedError, Result};
use crate::identifier::{require_name, validate_identifier};

/// Turns oracle lookups into validated table, column and join names.
///
/// Cheap to clone; nothing is cached between calls.
#[derive(Clone)]
pub struct MetadataResolver {
    oracle: Arc<dyn MetadataOracle>,
}

impl core::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetadataResolver").finish_non_exhaustive()
    }
}

impl MetadataResolver {
    pub fn new(oracle: Arc<dyn MetadataOracle>) -> Self {
        Self { oracle }
    }

    /// The underlying oracle
    pub fn oracle(&self) -> &dyn MetadataOracle {
        self.oracle.as_ref()
    }

    /// Validated table name of a mapped entity.
    pub fn entity_table(&self, entity: &str) -> Result<String> {
        let table = self
            .oracle
            .entity_table(entity)
            .ok_or_else(|| AggregatedError::UnknownEntity(entity.to_string()))?;
        validate_identifier(&table, "table")?;
        Ok(table)
    }

    /// Validated identifier columns, never empty.
    pub fn identifier_columns(&self, entity: &str) -> Result<Vec<String>> {
        let columns = self
            .oracle
            .identifier_columns(entity)
            .ok_or_else(|| AggregatedError::UnknownEntity(entity.to_string()))?;
        if columns.is_empty() {
            return Err(AggregatedError::invalid(format!(
                "Entity \"{entity}\" has no identifier columns"
            )));
        }
        for column in &columns {
            validate_identifier(column, "column")?;
        }
        Ok(columns)
    }

    /// First identifier column, used for the LEFT JOIN null guard.
    pub fn primary_identifier_column(&self, entity: &str) -> Result<String> {
        let mut columns = self.identifier_columns(entity)?;
        Ok(columns.swap_remove(0))
    }

    /// Declared type of `field`; unknown fields read as strings.
    pub fn field_type(&self, entity: &str, field: &str) -> FieldType {
        self.oracle.field_type(entity, field).unwrap_or_default()
    }

    /// `(field, column, type)` for every scalar field of `entity`.
    pub fn field_columns(&self, entity: &str) -> Result<Vec<(String, String, FieldType)>> {
        let fields = self
            .oracle
            .field_names(entity)
            .ok_or_else(|| AggregatedError::UnknownEntity(entity.to_string()))?;

        Ok(fields
            .into_iter()
            .filter_map(|field| {
                let column = self.oracle.field_column(entity, &field)?;
                let ty = self.field_type(entity, &field);
                Some((field, column, ty))
            })
            .collect())
    }

    /// Resolves join information for `relation` on `entity`.
    ///
    /// Owning-side to-one relations join through their own first join column.
    /// One-to-many (and inverse one-to-one) relations follow `mapped_by` to the
    /// owning association on the target and invert its join column.
    pub fn resolve_relation(&self, entity: &str, relation: &str) -> Result<RelationMetadata> {
        let entity = require_name(entity, "Entity")?;
        let relation = require_name(relation, "Relation")?;
        validate_identifier(relation, "relation")?;

        self.entity_table(entity)?;

        let unknown = || AggregatedError::UnknownRelation {
            entity: entity.to_string(),
            relation: relation.to_string(),
        };
        if !self.oracle.has_association(entity, relation) {
            return Err(unknown());
        }
        let mapping = self
            .oracle
            .association_mapping(entity, relation)
            .ok_or_else(unknown)?;

        if mapping.kind == RelationKind::ManyToMany {
            return Err(AggregatedError::UnsupportedRelationKind {
                entity: entity.to_string(),
                relation: relation.to_string(),
                reason: "ManyToMany relations are not supported".into(),
            });
        }

        self.entity_table(&mapping.target)?;

        let (base_column, related_column) = self.join_columns(entity, relation, &mapping)?;
        validate_identifier(&base_column, "column")?;
        validate_identifier(&related_column, "column")?;

        Ok(RelationMetadata {
            kind: mapping.kind,
            target: mapping.target,
            base_column,
            related_column,
        })
    }

    fn join_columns(
        &self,
        entity: &str,
        relation: &str,
        mapping: &AssociationMapping,
    ) -> Result<(String, String)> {
        let unresolvable = |reason: String| AggregatedError::UnresolvableJoin {
            entity: entity.to_string(),
            relation: relation.to_string(),
            reason,
        };

        if mapping.kind != RelationKind::OneToMany {
            if let Some(jc) = mapping.join_columns.first() {
                return match (&jc.name, &jc.referenced_column_name) {
                    (Some(name), Some(referenced)) => Ok((name.clone(), referenced.clone())),
                    _ => Err(unresolvable("join column is incomplete".into())),
                };
            }
        }

        let mapped_by = mapping
            .mapped_by
            .as_deref()
            .ok_or_else(|| unresolvable("relation has no join columns and no mapped_by".into()))?;

        let inverse = self
            .oracle
            .association_mapping(&mapping.target, mapped_by)
            .ok_or_else(|| {
                unresolvable(format!(
                    "inverse association \"{mapped_by}\" not found on \"{}\"",
                    mapping.target
                ))
            })?;

        match inverse.join_columns.first() {
            Some(jc) => match (&jc.name, &jc.referenced_column_name) {
                (Some(name), Some(referenced)) => Ok((referenced.clone(), name.clone())),
                _ => Err(unresolvable(format!(
                    "inverse association \"{mapped_by}\" has an incomplete join column"
                ))),
            },
            None => Err(unresolvable(format!(
                "inverse association \"{mapped_by}\" has no join columns"
            ))),
        }
    }

    /// Resolves a field name, raw column name or association join column to
    /// a validated column name.
    pub fn resolve_column(&self, entity: &str, name: &str) -> Result<String> {
        let name = require_name(name, "Column")?;
        let fields = self
            .oracle
            .field_names(entity)
            .ok_or_else(|| AggregatedError::UnknownEntity(entity.to_string()))?;

        let column = if let Some(column) = self.oracle.field_column(entity, name) {
            Some(column)
        } else if fields
            .iter()
            .any(|f| self.oracle.field_column(entity, f).as_deref() == Some(name))
        {
            Some(name.to_string())
        } else {
            self.oracle
                .association_names(entity)
                .iter()
                .filter_map(|assoc| self.oracle.association_mapping(entity, assoc))
                .flat_map(|mapping| mapping.join_columns)
                .find_map(|jc| jc.name.filter(|n| n == name))
        };

        let column = column.ok_or_else(|| AggregatedError::UnknownColumn {
            entity: entity.to_string(),
            column: name.to_string(),
        })?;
        validate_identifier(&column, "column")?;
        Ok(column)
    }

    /// Columns selected for a related entity.
    ///
    /// An empty request selects every identifier and scalar field. Identifier
    /// columns are appended when missing; duplicates keep their first position.
    pub fn relation_columns(&self, target: &str, requested: &[&str]) -> Result<Vec<String>> {
        let id_columns = self.identifier_columns(target)?;

        let names: Vec<String> = if requested.is_empty() {
            let mut names = self.oracle.identifier_fields(target).unwrap_or_default();
            names.extend(self.oracle.field_names(target).unwrap_or_default());
            names
        } else {
            requested.iter().map(|s| (*s).to_string()).collect()
        };

        let mut columns: Vec<String> = Vec::with_capacity(names.len() + id_columns.len());
        for name in &names {
            let column = self.resolve_column(target, name)?;
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        for id in id_columns {
            if !columns.contains(&id) {
                columns.push(id);
            }
        }
        Ok(columns)
    }
}
