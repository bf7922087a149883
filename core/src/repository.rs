//! Repository integration

use crate::error::Result;
use crate::query::QueryBuilder;

/// A repository bound to one entity type.
///
/// Implementors provide the entity type and a builder template; the default
/// [`aggregated_query`](Self::aggregated_query) binds one to the other.
///
/// ```ignore
/// struct PartnerRepository {
///     queries: QueryBuilder,
/// }
///
/// impl AggregatedRepository for PartnerRepository {
///     fn entity_type(&self) -> &str {
///         "Partner"
///     }
///
///     fn query_template(&self) -> &QueryBuilder {
///         &self.queries
///     }
/// }
///
/// let rows = repo.aggregated_query()?.with_count("orders")?.get_result()?;
/// ```
pub trait AggregatedRepository {
    /// Root entity type of every query from this repository
    fn entity_type(&self) -> &str;

    /// Unbound builder wired to the host's metadata, generators and executor
    fn query_template(&self) -> &QueryBuilder;

    /// Fresh builder bound to [`entity_type`](Self::entity_type).
    fn aggregated_query(&self) -> Result<QueryBuilder> {
        self.query_template().from(self.entity_type())
    }
}
