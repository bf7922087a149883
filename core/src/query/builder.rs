//! Fluent query builder.

use std::sync::Arc;

use aggregated_types::Value;

use super::{
    Direction, FilterPredicate, FilterValue, GeneratedQuery, LoadMethod, Operator, QueryDescriptor,
    RelationConfig, SortKey,
};
use crate::config::{Config, DEBUG_SQL_PREFIX};
use crate::error::{AggregatedError, Result};
use crate::executor::{Executor, RawRow, normalize_rows};
use crate::generator::GeneratorFactory;
use crate::hydrator::{Hydrated, Hydrator};
use crate::identifier::require_name;
use crate::metadata::{MetadataOracle, MetadataResolver};

/// Collaborators shared by every builder cloned from one template.
struct Shared {
    metadata: MetadataResolver,
    generators: GeneratorFactory,
    executor: Arc<dyn Executor>,
    config: Config,
}

/// Immutable fluent builder for one aggregated query.
///
/// Every step takes `&self` and returns a new builder, so a bound builder can
/// serve as a template for any number of independent queries. Validation
/// errors surface on the offending step; platform, execution and hydration
/// errors surface when the query runs.
///
/// ```ignore
/// let partners = queries
///     .from("Partner")?
///     .with_json_relation("profile", &["id", "name"])?
///     .with_json_collection("promocodes", &[])?
///     .with_count("orders")?
///     .r#where("status", "active")?
///     .order_by("createdAt", "DESC")?
///     .limit(50)?
///     .execute(ArrayHydrator)?;
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    shared: Arc<Shared>,
    descriptor: QueryDescriptor,
}

impl core::fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("descriptor", &self.descriptor)
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    /// Unbound builder. Call [`from`](Self::from) before anything else.
    pub fn new(
        metadata: Arc<dyn MetadataOracle>,
        generators: GeneratorFactory,
        executor: Arc<dyn Executor>,
        config: Config,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                metadata: MetadataResolver::new(metadata),
                generators,
                executor,
                config,
            }),
            descriptor: QueryDescriptor::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn metadata(&self) -> &MetadataResolver {
        &self.shared.metadata
    }

    /// The descriptor accumulated so far
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.shared.config.enabled {
            Ok(())
        } else {
            Err(AggregatedError::Disabled)
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        self.ensure_enabled()?;
        if self.descriptor.is_bound() {
            Ok(())
        } else {
            Err(AggregatedError::NotReady)
        }
    }

    fn with_descriptor(&self, descriptor: QueryDescriptor) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            descriptor,
        }
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Binds to `entity`, discarding everything accumulated so far.
    pub fn from(&self, entity: &str) -> Result<Self> {
        self.ensure_enabled()?;
        let entity = require_name(entity, "Entity")?;
        self.shared.metadata.entity_table(entity)?;
        Ok(self.with_descriptor(QueryDescriptor::new(entity)))
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Fails once one more relation or count would exceed `max_relations`.
    fn check_capacity(&self, name: &str, method: LoadMethod) -> Result<()> {
        let max = self.shared.config.max_relations;
        if max == 0 {
            return Ok(());
        }
        let set = match method {
            LoadMethod::Count => &self.descriptor.counts,
            _ => &self.descriptor.relations,
        };
        let requested = self.descriptor.relation_count() + usize::from(!set.contains(name));
        if requested > max as usize {
            return Err(AggregatedError::TooManyRelations { requested, max });
        }
        Ok(())
    }

    fn add_relation(&self, name: &str, columns: &[&str], method: LoadMethod) -> Result<Self> {
        self.ensure_ready()?;
        let name = require_name(name, "Relation")?;
        self.check_capacity(name, method)?;

        let target = &self.descriptor.target;
        let meta = self.shared.metadata.resolve_relation(target, name)?;

        let allowed = match method {
            LoadMethod::SingleObject => meta.kind.is_to_one(),
            LoadMethod::Collection | LoadMethod::Count => {
                meta.kind == crate::metadata::RelationKind::OneToMany
            }
        };
        if !allowed {
            let expected = match method {
                LoadMethod::SingleObject => "ManyToOne or OneToOne",
                _ => "OneToMany",
            };
            return Err(AggregatedError::UnsupportedRelationKind {
                entity: target.clone(),
                relation: name.to_string(),
                reason: format!("expected {expected}, found {}", meta.kind),
            });
        }

        let columns = match method {
            LoadMethod::Count => Vec::new(),
            _ => self.shared.metadata.relation_columns(&meta.target, columns)?,
        };

        let config = RelationConfig {
            name: name.to_string(),
            kind: meta.kind,
            target: meta.target,
            method,
            columns,
            base_column: meta.base_column,
            related_column: meta.related_column,
        };

        let mut descriptor = self.descriptor.clone();
        match method {
            LoadMethod::Count => descriptor.counts.insert(config),
            _ => descriptor.relations.insert(config),
        }
        Ok(self.with_descriptor(descriptor))
    }

    /// Eager-loads a to-one relation as a JSON object column.
    ///
    /// An empty `columns` selects every field of the target; identifier
    /// columns are always included.
    pub fn with_json_relation(&self, name: &str, columns: &[&str]) -> Result<Self> {
        self.add_relation(name, columns, LoadMethod::SingleObject)
    }

    /// Eager-loads a one-to-many relation as a JSON array column.
    pub fn with_json_collection(&self, name: &str, columns: &[&str]) -> Result<Self> {
        self.add_relation(name, columns, LoadMethod::Collection)
    }

    /// Adds a `<name>_count` column counting a one-to-many relation.
    pub fn with_count(&self, name: &str) -> Result<Self> {
        self.add_relation(name, &[], LoadMethod::Count)
    }

    // =========================================================================
    // Filters, sorting, paging
    // =========================================================================

    /// `field = value`, or `field IS NULL` for a null value.
    pub fn r#where(&self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.where_op(field, "=", value)
    }

    /// `field <op> value` with a whitelisted operator. Use
    /// [`where_in`](Self::where_in) for `IN`.
    pub fn where_op(&self, field: &str, operator: &str, value: impl Into<Value>) -> Result<Self> {
        self.ensure_ready()?;
        let operator = Operator::parse(operator).ok_or_else(|| {
            AggregatedError::invalid(format!(
                "Invalid operator \"{}\". Allowed: =, !=, <>, <, >, <=, >=, LIKE, NOT LIKE",
                operator.trim()
            ))
        })?;
        if operator == Operator::In {
            return Err(AggregatedError::invalid("Use where_in() for IN filters"));
        }

        let column = self.shared.metadata.resolve_column(&self.descriptor.target, field)?;
        self.push_filter(FilterPredicate {
            column,
            operator,
            value: FilterValue::Scalar(value.into()),
        })
    }

    /// `field IN (...)`, one bound parameter per value.
    pub fn where_in<I>(&self, field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.ensure_ready()?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(AggregatedError::invalid(format!(
                "where_in() requires a non-empty list for \"{field}\""
            )));
        }

        let column = self.shared.metadata.resolve_column(&self.descriptor.target, field)?;
        self.push_filter(FilterPredicate {
            column,
            operator: Operator::In,
            value: FilterValue::List(values),
        })
    }

    fn push_filter(&self, predicate: FilterPredicate) -> Result<Self> {
        predicate.validate()?;
        let mut descriptor = self.descriptor.clone();
        descriptor.filters.push(predicate);
        Ok(self.with_descriptor(descriptor))
    }

    /// Appends a sort key; `direction` is `ASC` or `DESC` in any case.
    pub fn order_by(&self, field: &str, direction: &str) -> Result<Self> {
        self.ensure_ready()?;
        let direction = Direction::parse(direction).ok_or_else(|| {
            AggregatedError::invalid(format!(
                "Invalid order direction \"{direction}\". Use ASC or DESC"
            ))
        })?;
        let column = self.shared.metadata.resolve_column(&self.descriptor.target, field)?;

        let mut descriptor = self.descriptor.clone();
        descriptor.sorts.push(SortKey { column, direction });
        Ok(self.with_descriptor(descriptor))
    }

    pub fn limit(&self, limit: i64) -> Result<Self> {
        self.ensure_ready()?;
        let limit = non_negative(limit, "Limit")?;
        let mut descriptor = self.descriptor.clone();
        descriptor.limit = Some(limit);
        Ok(self.with_descriptor(descriptor))
    }

    pub fn offset(&self, offset: i64) -> Result<Self> {
        self.ensure_ready()?;
        let offset = non_negative(offset, "Offset")?;
        let mut descriptor = self.descriptor.clone();
        descriptor.offset = Some(offset);
        Ok(self.with_descriptor(descriptor))
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Renders SQL and parameters for the active platform without executing.
    pub fn generate(&self) -> Result<GeneratedQuery> {
        self.ensure_ready()?;
        let generator = self
            .shared
            .generators
            .create(self.shared.executor.platform())?;
        generator.generate(&self.descriptor, &self.shared.metadata)
    }

    pub fn to_sql(&self) -> Result<String> {
        Ok(self.generate()?.sql)
    }

    pub fn parameters(&self) -> Result<Vec<Value>> {
        Ok(self.generate()?.params)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn fetch(&self) -> Result<Vec<RawRow>> {
        let GeneratedQuery { sql, params } = self.generate()?;
        let sql = if self.shared.config.debug {
            format!("{DEBUG_SQL_PREFIX}{sql}")
        } else {
            sql
        };

        crate::aggregated_trace_query!(sql, params.len());

        let rows = self
            .shared
            .executor
            .execute(&sql, &params)
            .map_err(|e| AggregatedError::Execution(e.to_string()))?;
        normalize_rows(rows)
    }

    /// Runs the query and hydrates every row with `hydrator`.
    pub fn execute<H: Hydrator>(&self, hydrator: H) -> Result<Vec<H::Output>> {
        let rows = self.fetch()?;
        let hydrated = hydrator.hydrate(
            rows,
            &self.descriptor.target,
            &self.descriptor.relations,
            &self.shared.metadata,
        )?;
        crate::aggregated_trace_hydrate!(hydrator.name(), hydrated.len());
        Ok(hydrated)
    }

    /// Runs the query with `LIMIT 1` and returns the first row, if any.
    pub fn execute_one<H: Hydrator>(&self, hydrator: H) -> Result<Option<H::Output>> {
        Ok(self.limit(1)?.execute(hydrator)?.into_iter().next())
    }

    /// Runs the query with the configured default hydrator.
    pub fn get_result(&self) -> Result<Vec<Hydrated>> {
        let rows = self.fetch()?;
        let kind = self.shared.config.default_hydrator;
        let hydrated = kind.hydrate(
            rows,
            &self.descriptor.target,
            &self.descriptor.relations,
            &self.shared.metadata,
        )?;
        crate::aggregated_trace_hydrate!(kind.as_str(), hydrated.len());
        Ok(hydrated)
    }

    /// [`get_result`](Self::get_result) with `LIMIT 1`.
    pub fn get_one(&self) -> Result<Option<Hydrated>> {
        Ok(self.limit(1)?.get_result()?.into_iter().next())
    }

    /// Pages through the result set `size` rows at a time, starting at the
    /// builder's offset. Iteration stops after the first short page or error.
    pub fn batches<H: Hydrator>(&self, size: u64, hydrator: H) -> Result<Batches<H>> {
        self.ensure_ready()?;
        if size == 0 {
            return Err(AggregatedError::invalid("Batch size must be greater than zero"));
        }
        Ok(Batches {
            offset: self.descriptor.offset.unwrap_or(0),
            builder: self.clone(),
            hydrator,
            size,
            done: false,
        })
    }
}

fn non_negative(n: i64, label: &str) -> Result<u64> {
    u64::try_from(n).map_err(|_| AggregatedError::invalid(format!("{label} must be >= 0, got {n}")))
}

/// Iterator over `limit`/`offset` pages. See [`QueryBuilder::batches`].
#[derive(Debug)]
pub struct Batches<H> {
    builder: QueryBuilder,
    hydrator: H,
    size: u64,
    offset: u64,
    done: bool,
}

impl<H: Hydrator> Iterator for Batches<H> {
    type Item = Result<Vec<H::Output>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut descriptor = self.builder.descriptor.clone();
        descriptor.limit = Some(self.size);
        descriptor.offset = Some(self.offset);

        match self.builder.with_descriptor(descriptor).execute(&self.hydrator) {
            Ok(page) if page.is_empty() => {
                self.done = true;
                None
            }
            Ok(page) => {
                if (page.len() as u64) < self.size {
                    self.done = true;
                }
                self.offset += self.size;
                Some(Ok(page))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::executor::{BoxError, Row};
    use crate::metadata::{AssociationMapping, EntityDef, InMemoryMetadata};
    use aggregated_types::FieldType;

    struct NoRows;

    impl Executor for NoRows {
        fn platform(&self) -> &str {
            "mysql"
        }

        fn execute(&self, _: &str, _: &[Value]) -> core::result::Result<Vec<Row>, BoxError> {
            Ok(Vec::new())
        }
    }

    fn builder(config: Config) -> QueryBuilder {
        let meta = InMemoryMetadata::new()
            .entity(
                EntityDef::new("Partner", "partners")
                    .id("id")
                    .field("status", FieldType::String)
                    .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id"))
                    .association("country", AssociationMapping::many_to_one("Country", "country_id", "id"))
                    .association("promocodes", AssociationMapping::one_to_many("Promocode", "partner")),
            )
            .entity(EntityDef::new("Profile", "profiles").id("id").field("name", FieldType::String))
            .entity(EntityDef::new("Country", "countries").id("id"))
            .entity(
                EntityDef::new("Promocode", "promocodes")
                    .id("id")
                    .association("partner", AssociationMapping::many_to_one("Partner", "partner_id", "id")),
            );
        QueryBuilder::new(Arc::new(meta), GeneratorFactory::new(), Arc::new(NoRows), config)
    }

    #[test]
    fn test_requires_binding() {
        let qb = builder(Config::default());
        assert_eq!(qb.limit(1).unwrap_err().kind(), ErrorKind::NotReady);
        assert_eq!(qb.with_count("promocodes").unwrap_err().kind(), ErrorKind::NotReady);
        assert_eq!(qb.from("  ").unwrap_err().kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(qb.from("Ghost").unwrap_err().kind(), ErrorKind::UnknownEntity);
    }

    #[test]
    fn test_disabled() {
        let qb = builder(Config::default().with_enabled(false));
        assert_eq!(qb.from("Partner").unwrap_err().kind(), ErrorKind::Disabled);
    }

    #[test]
    fn test_copy_on_write() {
        let base = builder(Config::default()).from("Partner").unwrap();
        let active = base.r#where("status", "active").unwrap();
        let limited = base.limit(0).unwrap();

        assert!(base.descriptor().filters.is_empty());
        assert_eq!(active.descriptor().filters.len(), 1);
        assert_eq!(active.descriptor().limit, None);
        assert_eq!(limited.descriptor().limit, Some(0));

        let rebound = active.from("Partner").unwrap();
        assert!(rebound.descriptor().filters.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let qb = builder(Config::default()).from("Partner").unwrap();
        let kind = |r: Result<QueryBuilder>| r.unwrap_err().kind();

        assert_eq!(kind(qb.limit(-1)), ErrorKind::InvalidConfiguration);
        assert_eq!(kind(qb.offset(-5)), ErrorKind::InvalidConfiguration);
        assert_eq!(kind(qb.order_by("id", "sideways")), ErrorKind::InvalidConfiguration);
        assert_eq!(kind(qb.where_op("id", "BETWEEN", 1)), ErrorKind::InvalidConfiguration);
        assert_eq!(kind(qb.where_op("id", "in", 1)), ErrorKind::InvalidConfiguration);
        assert_eq!(kind(qb.where_in("id", Vec::<i64>::new())), ErrorKind::InvalidConfiguration);
        assert_eq!(kind(qb.where_op("id", ">", Value::Null)), ErrorKind::UnsupportedNullComparison);
        assert_eq!(kind(qb.r#where("nope", 1)), ErrorKind::UnknownColumn);
        assert_eq!(kind(qb.with_json_relation("promocodes", &[])), ErrorKind::UnsupportedRelationKind);
        assert_eq!(kind(qb.with_json_collection("profile", &[])), ErrorKind::UnsupportedRelationKind);
        assert_eq!(kind(qb.with_count("profile")), ErrorKind::UnsupportedRelationKind);
        assert_eq!(kind(qb.with_json_relation("nope", &[])), ErrorKind::UnknownRelation);
        assert_eq!(kind(qb.with_json_relation("profile", &["ghost"])), ErrorKind::UnknownColumn);
    }

    #[test]
    fn test_max_relations() {
        let qb = builder(Config::default().with_max_relations(2)).from("Partner").unwrap();
        let qb = qb.with_json_relation("profile", &[]).unwrap().with_count("promocodes").unwrap();

        // Replacing an existing entry does not grow the set
        let qb = qb.with_json_relation("profile", &["name"]).unwrap();

        let err = qb.with_json_relation("country", &[]).unwrap_err();
        assert!(matches!(err, AggregatedError::TooManyRelations { requested: 3, max: 2 }));

        let unbounded = builder(Config::default().with_max_relations(0)).from("Partner").unwrap();
        assert!(unbounded
            .with_json_relation("profile", &[])
            .and_then(|q| q.with_json_relation("country", &[]))
            .and_then(|q| q.with_json_collection("promocodes", &[]))
            .and_then(|q| q.with_count("promocodes"))
            .is_ok());
    }

    #[test]
    fn test_generate_without_generator() {
        let qb = builder(Config::default()).from("Partner").unwrap();
        assert_eq!(qb.to_sql().unwrap_err().kind(), ErrorKind::UnsupportedPlatform);
    }
}
