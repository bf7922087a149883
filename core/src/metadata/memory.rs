use std::collections::BTreeMap;

use aggregated_types::FieldType;

use super::{AssociationMapping, MetadataOracle};

#[derive(Debug, Clone, PartialEq)]
struct FieldDef {
    name: String,
    column: String,
    ty: FieldType,
}

/// Mapping of one entity type, built fluently.
///
/// ```
/// use aggregated_core::metadata::{AssociationMapping, EntityDef};
/// use aggregated_types::FieldType;
///
/// let partner = EntityDef::new("Partner", "partners")
///     .id("id")
///     .field("name", FieldType::String)
///     .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id"));
/// assert_eq!(partner.name(), "Partner");
/// ```
#[derive(Debug, Clone)]
pub struct EntityDef {
    name: String,
    table: String,
    identifiers: Vec<String>,
    fields: Vec<FieldDef>,
    associations: Vec<(String, AssociationMapping)>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            identifiers: Vec::new(),
            fields: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integer identifier field stored in a column of the same name.
    #[must_use]
    pub fn id(self, field: impl Into<String>) -> Self {
        let field = field.into();
        let column = field.clone();
        self.id_with_column(field, column, FieldType::Integer)
    }

    #[must_use]
    pub fn id_with_column(
        mut self,
        field: impl Into<String>,
        column: impl Into<String>,
        ty: FieldType,
    ) -> Self {
        let field = field.into();
        self.identifiers.push(field.clone());
        self.field_with_column(field, column, ty)
    }

    /// Scalar field stored in a column of the same name.
    #[must_use]
    pub fn field(self, field: impl Into<String>, ty: FieldType) -> Self {
        let field = field.into();
        let column = field.clone();
        self.field_with_column(field, column, ty)
    }

    #[must_use]
    pub fn field_with_column(
        mut self,
        field: impl Into<String>,
        column: impl Into<String>,
        ty: FieldType,
    ) -> Self {
        self.fields.push(FieldDef {
            name: field.into(),
            column: column.into(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn association(mut self, name: impl Into<String>, mapping: AssociationMapping) -> Self {
        self.associations.push((name.into(), mapping));
        self
    }

    fn field_def(&self, field: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == field)
    }

    fn association_def(&self, name: &str) -> Option<&AssociationMapping> {
        self.associations
            .iter()
            .find_map(|(n, m)| (n == name).then_some(m))
    }
}

/// A [`MetadataOracle`] backed by entity definitions held in memory.
///
/// Useful for tests and for hosts that describe their schema in code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    entities: BTreeMap<String, EntityDef>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entity definition.
    #[must_use]
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.insert(def);
        self
    }

    pub fn insert(&mut self, def: EntityDef) {
        self.entities.insert(def.name.clone(), def);
    }

    fn get(&self, entity: &str) -> Option<&EntityDef> {
        self.entities.get(entity)
    }
}

impl MetadataOracle for InMemoryMetadata {
    fn entity_table(&self, entity: &str) -> Option<String> {
        self.get(entity).map(|e| e.table.clone())
    }

    fn identifier_fields(&self, entity: &str) -> Option<Vec<String>> {
        self.get(entity).map(|e| e.identifiers.clone())
    }

    fn identifier_columns(&self, entity: &str) -> Option<Vec<String>> {
        let def = self.get(entity)?;
        Some(
            def.identifiers
                .iter()
                .filter_map(|id| def.field_def(id).map(|f| f.column.clone()))
                .collect(),
        )
    }

    fn field_names(&self, entity: &str) -> Option<Vec<String>> {
        self.get(entity)
            .map(|e| e.fields.iter().map(|f| f.name.clone()).collect())
    }

    fn field_column(&self, entity: &str, field: &str) -> Option<String> {
        self.get(entity)?.field_def(field).map(|f| f.column.clone())
    }

    fn field_type(&self, entity: &str, field: &str) -> Option<FieldType> {
        self.get(entity)?.field_def(field).map(|f| f.ty)
    }

    fn has_association(&self, entity: &str, name: &str) -> bool {
        self.get(entity)
            .is_some_and(|e| e.association_def(name).is_some())
    }

    fn association_mapping(&self, entity: &str, name: &str) -> Option<AssociationMapping> {
        self.get(entity)?.association_def(name).cloned()
    }

    fn association_names(&self, entity: &str) -> Vec<String> {
        self.get(entity)
            .map(|e| e.associations.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let meta = InMemoryMetadata::new().entity(
            EntityDef::new("Partner", "partners")
                .id("id")
                .field_with_column("createdAt", "created_at", FieldType::DateTime)
                .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id")),
        );

        assert_eq!(meta.entity_table("Partner").as_deref(), Some("partners"));
        assert_eq!(meta.entity_table("Nope"), None);
        assert_eq!(meta.identifier_columns("Partner"), Some(vec!["id".to_string()]));
        assert_eq!(
            meta.field_names("Partner"),
            Some(vec!["id".to_string(), "createdAt".to_string()])
        );
        assert_eq!(meta.field_column("Partner", "createdAt").as_deref(), Some("created_at"));
        assert_eq!(meta.field_type("Partner", "createdAt"), Some(FieldType::DateTime));
        assert_eq!(meta.field_type("Partner", "id"), Some(FieldType::Integer));
        assert!(meta.has_association("Partner", "profile"));
        assert!(!meta.has_association("Partner", "orders"));
        assert_eq!(meta.association_names("Partner"), vec!["profile".to_string()]);
    }
}
