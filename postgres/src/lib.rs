//! PostgreSQL support for aggregated queries
//!
//! [`PostgresGenerator`] renders single relations with `json_build_object`,
//! collections with `json_agg` defaulting to `'[]'::json`, and binds numbered
//! `$n` placeholders.

use core::fmt::Write;

use aggregated_core::error::Result;
use aggregated_core::generator::{
    BASE_ALIAS, COLLECTION_ALIAS, SelectParts, SqlGenerator, count_projection, relation_alias,
    render_order_by, render_where, validate_descriptor, write_json_pairs,
};
use aggregated_core::metadata::MetadataResolver;
use aggregated_core::query::{GeneratedQuery, LoadMethod, QueryDescriptor, RelationConfig};
use aggregated_types::Dialect;

/// SQL generator for PostgreSQL.
///
/// JSON expressions are cast to `text` so drivers hand them back as strings,
/// the same shape the MySQL family returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGenerator;

impl PostgresGenerator {
    pub const fn new() -> Self {
        Self
    }

    fn single_relation(config: &RelationConfig, table: &str, id_column: &str, parts: &mut SelectParts) {
        let name = &config.name;
        let alias = relation_alias(name);

        let mut projection =
            format!("CASE WHEN {alias}.{id_column} IS NULL THEN NULL ELSE json_build_object(");
        write_json_pairs(&alias, &config.columns, &mut projection);
        let _ = write!(projection, ")::text END AS {name}");
        parts.projections.push(projection);

        parts.joins.push(format!(
            "LEFT JOIN {table} {alias} ON {alias}.{} = {BASE_ALIAS}.{}",
            config.related_column, config.base_column
        ));
    }

    fn collection(config: &RelationConfig, table: &str, parts: &mut SelectParts) {
        let mut projection = String::from("(SELECT COALESCE(json_agg(json_build_object(");
        write_json_pairs(COLLECTION_ALIAS, &config.columns, &mut projection);
        let _ = write!(
            projection,
            ")), '[]'::json)::text FROM {table} {COLLECTION_ALIAS} WHERE {COLLECTION_ALIAS}.{} = {BASE_ALIAS}.{}) AS {}",
            config.related_column, config.base_column, config.name
        );
        parts.projections.push(projection);
    }
}

impl SqlGenerator for PostgresGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
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
        parts.where_clause =
            render_where(BASE_ALIAS, &descriptor.filters, Dialect::PostgreSQL, &mut params)?;
        parts.order_by = render_order_by(BASE_ALIAS, &descriptor.sorts);
        parts.limit = descriptor.limit;
        parts.offset = descriptor.offset;

        Ok(GeneratedQuery {
            sql: parts.finish(),
            params,
        })
    }
}
