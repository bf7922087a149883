//! SQL generation
//!
//! A [`SqlGenerator`] renders a [`QueryDescriptor`] into one `SELECT`. The
//! pieces that do not depend on the JSON dialect (WHERE, ORDER BY, paging,
//! counts and statement assembly) live here so every dialect emits them
//! identically.

mod factory;

pub use factory::GeneratorFactory;

use core::fmt::Write;

use aggregated_types::{Dialect, Value};

use crate::error::{AggregatedError, Result};
use crate::identifier::validate_identifier;
use crate::metadata::MetadataResolver;
use crate::query::{FilterPredicate, FilterValue, GeneratedQuery, Operator, QueryDescriptor, SortKey};

/// Alias of the root table.
pub const BASE_ALIAS: &str = "e";
/// Alias of the target table inside collection subqueries.
pub const COLLECTION_ALIAS: &str = "sub";
/// Alias of the target table inside count subqueries.
pub const COUNT_ALIAS: &str = "cnt";
/// Suffix of count projections.
pub const COUNT_SUFFIX: &str = "_count";

/// Alias of the joined table for a single-object relation.
#[must_use]
pub fn relation_alias(name: &str) -> String {
    format!("rel_{name}")
}

/// Renders a descriptor into SQL for one database family.
pub trait SqlGenerator: Send + Sync {
    /// Placeholder style and JSON dialect of the output
    fn dialect(&self) -> Dialect;

    /// Renders one statement. Nothing is cached.
    fn generate(&self, descriptor: &QueryDescriptor, metadata: &MetadataResolver) -> Result<GeneratedQuery>;
}

/// Checks that a descriptor is bound and that every name it will interpolate
/// is a safe identifier.
pub fn validate_descriptor(descriptor: &QueryDescriptor) -> Result<()> {
    if !descriptor.is_bound() {
        return Err(AggregatedError::NotReady);
    }
    for config in descriptor.relations.iter().chain(descriptor.counts.iter()) {
        validate_identifier(&config.name, "relation")?;
        validate_identifier(&config.base_column, "column")?;
        validate_identifier(&config.related_column, "column")?;
        for column in &config.columns {
            validate_identifier(column, "column")?;
        }
    }
    for filter in &descriptor.filters {
        validate_identifier(&filter.column, "column")?;
    }
    for sort in &descriptor.sorts {
        validate_identifier(&sort.column, "column")?;
    }
    Ok(())
}

/// Writes `'col', alias.col, ...` for a JSON object constructor.
pub fn write_json_pairs(alias: &str, columns: &[String], sql: &mut String) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        let _ = write!(sql, "'{column}', {alias}.{column}");
    }
}

/// `(SELECT COUNT(*) FROM table cnt WHERE cnt.related = e.base) AS name_count`
#[must_use]
pub fn count_projection(table: &str, related_column: &str, base_column: &str, name: &str) -> String {
    format!(
        "(SELECT COUNT(*) FROM {table} {COUNT_ALIAS} WHERE {COUNT_ALIAS}.{related_column} = {BASE_ALIAS}.{base_column}) AS {name}{COUNT_SUFFIX}"
    )
}

/// Renders filters joined with `AND`, appending bound values to `params`.
///
/// Returns an empty string when there are no filters. Placeholders are
/// numbered from `params.len() + 1` for dialects that number them.
pub fn render_where(
    alias: &str,
    filters: &[FilterPredicate],
    dialect: Dialect,
    params: &mut Vec<Value>,
) -> Result<String> {
    let mut conditions = Vec::with_capacity(filters.len());

    for filter in filters {
        filter.validate()?;
        let column = &filter.column;

        let condition = match &filter.value {
            FilterValue::List(values) => {
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    params.push(value.clone());
                    placeholders.push(dialect.render_placeholder(params.len()));
                }
                format!("{alias}.{column} IN ({})", placeholders.join(", "))
            }
            FilterValue::Scalar(Value::Null) => match filter.operator {
                Operator::Eq => format!("{alias}.{column} IS NULL"),
                _ => format!("{alias}.{column} IS NOT NULL"),
            },
            FilterValue::Scalar(value) => {
                params.push(value.clone());
                format!(
                    "{alias}.{column} {} {}",
                    filter.operator.as_str(),
                    dialect.render_placeholder(params.len())
                )
            }
        };
        conditions.push(condition);
    }

    Ok(conditions.join(" AND "))
}

/// `alias.col DIR, ...`, empty when there are no sort keys.
#[must_use]
pub fn render_order_by(alias: &str, sorts: &[SortKey]) -> String {
    sorts
        .iter()
        .map(|s| format!("{alias}.{} {}", s.column, s.direction.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collected clauses of one `SELECT`, assembled in a fixed order.
#[derive(Debug, Clone, Default)]
pub struct SelectParts {
    pub projections: Vec<String>,
    pub from: String,
    pub joins: Vec<String>,
    pub where_clause: String,
    pub order_by: String,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectParts {
    /// Starts with `e.*` from `table e`.
    pub fn new(table: &str) -> Self {
        Self {
            projections: vec![format!("{BASE_ALIAS}.*")],
            from: format!("{table} {BASE_ALIAS}"),
            ..Self::default()
        }
    }

    /// `SELECT ... FROM ... [joins] [WHERE] [ORDER BY] [LIMIT n] [OFFSET n]`
    #[must_use]
    pub fn finish(self) -> String {
        let mut sql = String::with_capacity(256);
        sql.push_str("SELECT ");
        sql.push_str(&self.projections.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by);
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;

    fn filter(column: &str, operator: Operator, value: FilterValue) -> FilterPredicate {
        FilterPredicate {
            column: column.into(),
            operator,
            value,
        }
    }

    #[test]
    fn test_where_binds_in_emission_order() {
        let filters = vec![
            filter("status", Operator::Eq, FilterValue::Scalar("active".into())),
            filter("deleted_at", Operator::Eq, FilterValue::Scalar(Value::Null)),
            filter("id", Operator::In, FilterValue::List(vec![1.into(), 2.into(), 3.into()])),
            filter("name", Operator::NotLike, FilterValue::Scalar("%test%".into())),
            filter("parent_id", Operator::Ne, FilterValue::Scalar(Value::Null)),
        ];

        let mut params = Vec::new();
        let sql = render_where("e", &filters, Dialect::MySQL, &mut params).unwrap();
        assert_eq!(
            sql,
            "e.status = ? AND e.deleted_at IS NULL AND e.id IN (?, ?, ?) AND e.name NOT LIKE ? AND e.parent_id IS NOT NULL"
        );
        assert_eq!(
            params,
            vec![Value::from("active"), 1.into(), 2.into(), 3.into(), "%test%".into()]
        );

        let mut params = Vec::new();
        let sql = render_where("e", &filters, Dialect::PostgreSQL, &mut params).unwrap();
        assert_eq!(
            sql,
            "e.status = $1 AND e.deleted_at IS NULL AND e.id IN ($2, $3, $4) AND e.name NOT LIKE $5 AND e.parent_id IS NOT NULL"
        );
    }

    #[test]
    fn test_where_rejects_null_ordering() {
        let filters = vec![filter("score", Operator::Lt, FilterValue::Scalar(Value::Null))];
        let err = render_where("e", &filters, Dialect::MySQL, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, AggregatedError::UnsupportedNullComparison { .. }));
    }

    #[test]
    fn test_order_by() {
        let sorts = vec![
            SortKey {
                column: "created_at".into(),
                direction: Direction::Desc,
            },
            SortKey {
                column: "id".into(),
                direction: Direction::Asc,
            },
        ];
        assert_eq!(render_order_by("e", &sorts), "e.created_at DESC, e.id ASC");
        assert_eq!(render_order_by("e", &[]), "");
    }

    #[test]
    fn test_select_parts_order() {
        let mut parts = SelectParts::new("partners");
        parts.projections.push(count_projection("orders", "partner_id", "id", "orders"));
        parts.where_clause = "e.id = ?".into();
        parts.limit = Some(0);
        assert_eq!(
            parts.finish(),
            "SELECT e.*, (SELECT COUNT(*) FROM orders cnt WHERE cnt.partner_id = e.id) AS orders_count FROM partners e WHERE e.id = ? LIMIT 0"
        );
    }

    #[test]
    fn test_validate_descriptor() {
        assert!(matches!(
            validate_descriptor(&QueryDescriptor::default()),
            Err(AggregatedError::NotReady)
        ));

        let mut descriptor = QueryDescriptor::new("Partner");
        assert!(validate_descriptor(&descriptor).is_ok());

        descriptor.sorts.push(SortKey {
            column: "id; DROP TABLE partners".into(),
            direction: Direction::Asc,
        });
        assert!(matches!(
            validate_descriptor(&descriptor),
            Err(AggregatedError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_json_pairs() {
        let mut sql = String::new();
        write_json_pairs("sub", &["id".into(), "code".into()], &mut sql);
        assert_eq!(sql, "'id', sub.id, 'code', sub.code");
    }
}
