mod common;

use std::sync::Arc;

use aggregated::hydrator::ArrayHydrator;
use aggregated::query::QueryBuilder;
use aggregated::repository::AggregatedRepository;
use aggregated::{Config, ErrorKind};
use common::{RecordingExecutor, builder_with, row};
use serde_json::json;

struct PartnerRepository {
    queries: QueryBuilder,
}

impl AggregatedRepository for PartnerRepository {
    fn entity_type(&self) -> &str {
        "Partner"
    }

    fn query_template(&self) -> &QueryBuilder {
        &self.queries
    }
}

struct GhostRepository {
    queries: QueryBuilder,
}

impl AggregatedRepository for GhostRepository {
    fn entity_type(&self) -> &str {
        "Ghost"
    }

    fn query_template(&self) -> &QueryBuilder {
        &self.queries
    }
}

fn repository() -> (PartnerRepository, Arc<RecordingExecutor>) {
    let executor = RecordingExecutor::new("postgresql");
    let queries = builder_with(Arc::clone(&executor), Config::default());
    (PartnerRepository { queries }, executor)
}

#[test]
fn test_aggregated_query_is_bound_to_entity() {
    let (repo, executor) = repository();
    executor.respond(vec![row(json!({"id": 1, "orders_count": 3}))]);

    let rows = repo
        .aggregated_query()
        .unwrap()
        .with_count("orders")
        .unwrap()
        .execute(ArrayHydrator)
        .unwrap();

    assert_eq!(rows[0]["orders_count"], json!(3));
    assert_eq!(
        executor.last_sql(),
        "SELECT e.*, (SELECT COUNT(*) FROM orders cnt WHERE cnt.partner_id = e.id) AS orders_count FROM partners e"
    );
}

#[test]
fn test_each_call_starts_fresh() {
    let (repo, _) = repository();
    let filtered = repo.aggregated_query().unwrap().r#where("status", "active").unwrap();
    assert_eq!(filtered.descriptor().filters.len(), 1);

    let fresh = repo.aggregated_query().unwrap();
    assert!(fresh.descriptor().filters.is_empty());
    assert_eq!(fresh.descriptor().target, "Partner");
    assert!(repo.query_template().descriptor().target.is_empty());
}

#[test]
fn test_unmapped_repository_entity_fails() {
    let (repo, _) = repository();
    let ghost = GhostRepository {
        queries: repo.queries.clone(),
    };
    assert_eq!(ghost.aggregated_query().unwrap_err().kind(), ErrorKind::UnknownEntity);
}
