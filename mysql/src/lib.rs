//! MySQL support for aggregated queries
//!
//! [`MySqlGenerator`] renders single relations with `JSON_OBJECT`, collections
//! with `JSON_ARRAYAGG` (empty array via `JSON_ARRAY()`), and binds `?`
//! placeholders. MariaDB shares this generator.

use core::fmt::Write;

use aggregated_core::error::Result;
use aggregated_core::generator::{
    BASE_ALIAS, COLLECTION_ALIAS, SelectParts, SqlGenerator, count_projection, relation_alias,
    render_order_by, render_where, validate_descriptor, write_json_pairs,
};
use aggregated_core::metadata::MetadataResolver;
use aggregated_core::query::{GeneratedQuery, LoadMethod, QueryDescriptor, RelationConfig};
use aggregated_types::Dialect;

/// Largest `LIMIT` MySQL accepts, used when only an offset is set.
pub const UNBOUNDED_LIMIT: u64 = u64::MAX;

/// SQL generator for the MySQL family.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGenerator;

impl MySqlGenerator {
    pub const fn new() -> Self {
        Self
    }

    /// `CASE WHEN rel_x.id IS NULL THEN NULL ELSE JSON_OBJECT(...) END AS x`
    /// plus its `LEFT JOIN`.
    fn single_relation(config: &RelationConfig, table: &str, id_column: &str, parts: &mut SelectParts) {
        let name = &config.name;
        let alias = relation_alias(name);

        let mut projection = format!("CASE WHEN {alias}.{id_column} IS NULL THEN NULL ELSE JSON_OBJECT(");
        write_json_pairs(&alias, &config.columns, &mut projection);
        let _ = write!(projection, ") END AS {name}");
        parts.projections.push(projection);

        parts.joins.push(format!(
            "LEFT JOIN {table} {alias} ON {alias}.{} = {BASE_ALIAS}.{}",
            config.related_column, config.base_column
        ));
    }

    fn collection(config: &RelationConfig, table: &str, parts: &mut SelectParts) {
        let mut projection = String::from("(SELECT COALESCE(JSON_ARRAYAGG(JSON_OBJECT(");
        write_json_pairs(COLLECTION_ALIAS, &config.columns, &mut projection);
        let _ = write!(
            projection,
            ")), JSON_ARRAY()) FROM {table} {COLLECTION_ALIAS} WHERE {COLLECTION_ALIAS}.{} = {BASE_ALIAS}.{}) AS {}",
            config.related_column, config.base_column, config.name
        );
        parts.projections.push(projection);
    }
}

impl SqlGenerator for MySqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    fn generate(&self, descriptor: &QueryDescriptor, metadata: &MetadataResolver) -> Result<GeneratedQuery> {
        validate_descriptor(descriptor)?;

        let mut parts = SelectParts::new(&metadata.entity_table(&descriptor.target)?);

        for config in &descriptor.relations {
            let table = metadata.entity_table(&config.target)?;
            match config.method {
                LoadMethod::SingleObject => {
                    let id_column = metadata.primary_identifier_column(&config.target)?;
                    Self::single_relation(config, &table, &id_column, &mut parts);
                }
                LoadMethod::Collection => Self::collection(config, &table, &mut parts),
                LoadMethod::Count => parts.projections.push(count_projection(
                    &table,
                    &config.related_column,
                    &config.base_column,
                    &config.name,
                )),
            }
        }

        for config in &descriptor.counts {
            let table = metadata.entity_table(&config.target)?;
            parts.projections.push(count_projection(
                &table,
                &config.related_column,
                &config.base_column,
                &config.name,
            ));
        }

        let mut params = Vec::new();
        parts.where_clause = render_where(BASE_ALIAS, &descriptor.filters, Dialect::MySQL, &mut params)?;
        parts.order_by = render_order_by(BASE_ALIAS, &descriptor.sorts);
        // OFFSET without LIMIT is a syntax error in MySQL and MariaDB
        parts.limit = match (descriptor.limit, descriptor.offset) {
            (None, Some(_)) => Some(UNBOUNDED_LIMIT),
            (limit, _) => limit,
        };
        parts.offset = descriptor.offset;

        Ok(GeneratedQuery {
            sql: parts.finish(),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregated_core::metadata::{AssociationMapping, EntityDef, InMemoryMetadata, RelationKind};
    use aggregated_core::query::{Direction, FilterPredicate, FilterValue, Operator, SortKey};
    use aggregated_types::{FieldType, Value};
    use std::sync::Arc;

    fn metadata() -> MetadataResolver {
        let meta = InMemoryMetadata::new()
            .entity(
                EntityDef::new("Partner", "partners")
                    .id("id")
                    .field("status", FieldType::String)
                    .field_with_column("createdAt", "created_at", FieldType::DateTime)
                    .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id"))
                    .association("promocodes", AssociationMapping::one_to_many("Promocode", "partner")),
            )
            .entity(
                EntityDef::new("Profile", "profiles")
                    .id("id")
                    .field("name", FieldType::String),
            )
            .entity(
                EntityDef::new("Promocode", "promocodes")
                    .id("id")
                    .field("code", FieldType::String)
                    .association("partner", AssociationMapping::many_to_one("Partner", "partner_id", "id")),
            );
        MetadataResolver::new(Arc::new(meta))
    }

    fn relation(
        name: &str,
        target: &str,
        method: LoadMethod,
        columns: &[&str],
        base: &str,
        related: &str,
    ) -> RelationConfig {
        RelationConfig {
            name: name.into(),
            kind: match method {
                LoadMethod::SingleObject => RelationKind::ManyToOne,
                _ => RelationKind::OneToMany,
            },
            target: target.into(),
            method,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            base_column: base.into(),
            related_column: related.into(),
        }
    }

    #[test]
    fn test_single_relation_with_filters_and_paging() {
        let mut descriptor = QueryDescriptor::new("Partner");
        descriptor.relations.insert(relation(
            "profile",
            "Profile",
            LoadMethod::SingleObject,
            &["id", "name"],
            "profile_id",
            "id",
        ));
        descriptor.filters.push(FilterPredicate {
            column: "status".into(),
            operator: Operator::Eq,
            value: FilterValue::Scalar("active".into()),
        });
        descriptor.sorts.push(SortKey {
            column: "created_at".into(),
            direction: Direction::Desc,
        });
        descriptor.limit = Some(50);
        descriptor.offset = Some(10);

        let query = MySqlGenerator.generate(&descriptor, &metadata()).unwrap();
        assert_eq!(
            query.sql,
            "SELECT e.*, CASE WHEN rel_profile.id IS NULL THEN NULL ELSE JSON_OBJECT('id', rel_profile.id, 'name', rel_profile.name) END AS profile \
             FROM partners e LEFT JOIN profiles rel_profile ON rel_profile.id = e.profile_id \
             WHERE e.status = ? ORDER BY e.created_at DESC LIMIT 50 OFFSET 10"
        );
        assert_eq!(query.params, vec![Value::from("active")]);
    }

    #[test]
    fn test_collection_and_count() {
        let mut descriptor = QueryDescriptor::new("Partner");
        descriptor.relations.insert(relation(
            "promocodes",
            "Promocode",
            LoadMethod::Collection,
            &["id", "code"],
            "id",
            "partner_id",
        ));
        descriptor.counts.insert(relation("promocodes", "Promocode", LoadMethod::Count, &[], "id", "partner_id"));

        let query = MySqlGenerator.generate(&descriptor, &metadata()).unwrap();
        assert_eq!(
            query.sql,
            "SELECT e.*, (SELECT COALESCE(JSON_ARRAYAGG(JSON_OBJECT('id', sub.id, 'code', sub.code)), JSON_ARRAY()) \
             FROM promocodes sub WHERE sub.partner_id = e.id) AS promocodes, \
             (SELECT COUNT(*) FROM promocodes cnt WHERE cnt.partner_id = e.id) AS promocodes_count \
             FROM partners e"
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_in_and_null_filters() {
        let mut descriptor = QueryDescriptor::new("Partner");
        descriptor.filters.push(FilterPredicate {
            column: "id".into(),
            operator: Operator::In,
            value: FilterValue::List(vec![3.into(), "x".into(), true.into()]),
        });
        descriptor.filters.push(FilterPredicate {
            column: "status".into(),
            operator: Operator::NotEq,
            value: FilterValue::Scalar(Value::Null),
        });

        let query = MySqlGenerator.generate(&descriptor, &metadata()).unwrap();
        assert_eq!(
            query.sql,
            "SELECT e.* FROM partners e WHERE e.id IN (?, ?, ?) AND e.status IS NOT NULL"
        );
        assert_eq!(query.params, vec![Value::Int(3), Value::from("x"), Value::Bool(true)]);
    }

    #[test]
    fn test_offset_without_limit() {
        let mut descriptor = QueryDescriptor::new("Partner");
        descriptor.offset = Some(20);

        let query = MySqlGenerator.generate(&descriptor, &metadata()).unwrap();
        assert_eq!(
            query.sql,
            "SELECT e.* FROM partners e LIMIT 18446744073709551615 OFFSET 20"
        );

        descriptor.limit = Some(0);
        let query = MySqlGenerator.generate(&descriptor, &metadata()).unwrap();
        assert!(query.sql.ends_with("LIMIT 0 OFFSET 20"), "{}", query.sql);
    }

    #[test]
    fn test_unbound_descriptor() {
        let err = MySqlGenerator
            .generate(&QueryDescriptor::default(), &metadata())
            .unwrap_err();
        assert_eq!(err.kind(), aggregated_core::ErrorKind::NotReady);
    }
}
