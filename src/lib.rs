//! # Aggregated queries for Rust
//!
//! Loads an entity together with its to-one relations, one-to-many
//! collections and relation counts in a single SQL statement. Related rows
//! are embedded with the database's native JSON aggregation and decoded back
//! into maps, typed entity graphs or your own `serde` projections.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use aggregated::prelude::*;
//! use aggregated::executor::BoxError;
//!
//! struct Recorder;
//!
//! impl Executor for Recorder {
//!     fn platform(&self) -> &str {
//!         "mariadb"
//!     }
//!
//!     fn execute(&self, _sql: &str, _params: &[Value]) -> std::result::Result<Vec<Row>, BoxError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # fn main() -> aggregated::Result<()> {
//! let metadata = InMemoryMetadata::new()
//!     .entity(
//!         EntityDef::new("Partner", "partners")
//!             .id("id")
//!             .field("status", FieldType::String)
//!             .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id")),
//!     )
//!     .entity(EntityDef::new("Profile", "profiles").id("id").field("name", FieldType::String));
//!
//! let queries = aggregated::builder(Arc::new(metadata), Arc::new(Recorder), Config::default());
//!
//! let sql = queries
//!     .from("Partner")?
//!     .with_json_relation("profile", &["id", "name"])?
//!     .r#where("status", "active")?
//!     .to_sql()?;
//!
//! assert!(sql.contains("LEFT JOIN profiles rel_profile ON rel_profile.id = e.profile_id"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Database Support
//!
//! | Database   | Platform keys                              | Feature Flag |
//! |------------|--------------------------------------------|--------------|
//! | MySQL      | `mysql`, `mariadb`                         | `mysql`      |
//! | PostgreSQL | `postgresql`, `postgres`, `pg`, `pgsql`    | `postgres`   |
//!
//! ## Feature Flags
//!
//! - `mysql` / `postgres` - dialect generators (both on by default)
//! - `tracing` - `debug` events for every executed statement and hydrated batch

use std::sync::Arc;

pub use aggregated_core::{
    config, error, executor, generator, hydrator, identifier, metadata, query, repository,
};
pub use aggregated_core::{AggregatedError, Config, ConfigError, ErrorKind, Result};
pub use aggregated_types::{Dialect, FieldType, Value};

#[cfg(feature = "mysql")]
pub use aggregated_mysql::MySqlGenerator;
#[cfg(feature = "postgres")]
pub use aggregated_postgres::PostgresGenerator;

use aggregated_core::executor::Executor;
use aggregated_core::generator::GeneratorFactory;
use aggregated_core::metadata::MetadataOracle;
use aggregated_core::query::QueryBuilder;

/// A factory holding every generator enabled by cargo features.
pub fn default_generators() -> GeneratorFactory {
    #[allow(unused_mut)]
    let mut factory = GeneratorFactory::new();
    #[cfg(feature = "mysql")]
    factory.register_dialect(Dialect::MySQL, Arc::new(MySqlGenerator::new()));
    #[cfg(feature = "postgres")]
    factory.register_dialect(Dialect::PostgreSQL, Arc::new(PostgresGenerator::new()));
    factory
}

/// Unbound builder wired to [`default_generators`].
pub fn builder(
    metadata: Arc<dyn MetadataOracle>,
    executor: Arc<dyn Executor>,
    config: Config,
) -> QueryBuilder {
    QueryBuilder::new(metadata, default_generators(), executor, config)
}

/// Prelude module for commonly used items
pub mod prelude {
    pub use aggregated_core::prelude::*;

    #[cfg(feature = "mysql")]
    pub use crate::MySqlGenerator;
    #[cfg(feature = "postgres")]
    pub use crate::PostgresGenerator;
}
