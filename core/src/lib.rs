//! Core of the aggregated query layer
//!
//! Collapses N+1 relation loads into one statement per request: related rows
//! are embedded as JSON objects and arrays, counts as correlated subqueries.
//!
//! - [`metadata`] - metadata oracle trait, resolver and in-memory oracle
//! - [`query`] - the descriptor and the fluent [`QueryBuilder`](query::QueryBuilder)
//! - [`generator`] - the dialect-neutral half of SQL generation and the factory
//! - [`executor`] - the statement execution boundary
//! - [`hydrator`] - array, entity and projection hydration
//!
//! Dialect generators live in `aggregated-mysql` and `aggregated-postgres`.

pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod hydrator;
pub mod identifier;
pub mod metadata;
pub mod query;
pub mod repository;
mod trace;

pub use aggregated_types::{Dialect, FieldType, Value};
pub use config::{Config, ConfigError};
pub use error::{AggregatedError, ErrorKind, Result};

/// Prelude module for commonly used items
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{AggregatedError, ErrorKind, Result};
    pub use crate::executor::{Executor, Row};
    pub use crate::generator::{GeneratorFactory, SqlGenerator};
    pub use crate::hydrator::{
        ArrayHydrator, DtoHydrator, Entity, EntityHydrator, FieldValue, Hydrated, HydratedRow,
        Hydrator, HydratorKind,
    };
    pub use crate::metadata::{
        AssociationMapping, EntityDef, InMemoryMetadata, MetadataOracle, RelationKind,
    };
    pub use crate::query::QueryBuilder;
    pub use crate::repository::AggregatedRepository;
    pub use aggregated_types::{Dialect, FieldType, Value};
}
