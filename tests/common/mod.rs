#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aggregated::executor::{BoxError, Executor, Row};
use aggregated::metadata::{AssociationMapping, EntityDef, InMemoryMetadata, RelationKind};
use aggregated::query::QueryBuilder;
use aggregated::{Config, FieldType, Value};

/// partners -> profiles / countries (to-one), promocodes / orders (to-many)
pub fn metadata() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .entity(
            EntityDef::new("Partner", "partners")
                .id("id")
                .field("name", FieldType::String)
                .field("status", FieldType::String)
                .field("active", FieldType::Boolean)
                .field("rating", FieldType::Float)
                .field("tags", FieldType::SimpleArray)
                .field("settings", FieldType::Json)
                .field_with_column("createdAt", "created_at", FieldType::DateTime)
                .association("profile", AssociationMapping::many_to_one("Profile", "profile_id", "id"))
                .association("country", AssociationMapping::many_to_one("Country", "country_id", "id"))
                .association("promocodes", AssociationMapping::one_to_many("Promocode", "partner"))
                .association("orders", AssociationMapping::one_to_many("Order", "partner"))
                .association("categories", AssociationMapping::many_to_many("Category")),
        )
        .entity(
            EntityDef::new("Profile", "profiles")
                .id("id")
                .field("name", FieldType::String)
                .field("bio", FieldType::String)
                .association(
                    "partner",
                    AssociationMapping {
                        kind: RelationKind::OneToOne,
                        target: "Partner".into(),
                        join_columns: vec![],
                        mapped_by: Some("profile".into()),
                    },
                ),
        )
        .entity(
            EntityDef::new("Country", "countries")
                .id("id")
                .field("name", FieldType::String)
                .field("code", FieldType::String),
        )
        .entity(
            EntityDef::new("Promocode", "promocodes")
                .id("id")
                .field("code", FieldType::String)
                .field("discount", FieldType::Float)
                .association("partner", AssociationMapping::many_to_one("Partner", "partner_id", "id")),
        )
        .entity(
            EntityDef::new("Order", "orders")
                .id("id")
                .field("total", FieldType::Float)
                .field_with_column("placedAt", "placed_at", FieldType::DateTime)
                .association("partner", AssociationMapping::many_to_one("Partner", "partner_id", "id")),
        )
        .entity(EntityDef::new("Category", "categories").id("id").field("name", FieldType::String))
}

/// Executor that records every statement and replays queued responses.
pub struct RecordingExecutor {
    platform: String,
    responses: Mutex<VecDeque<Result<Vec<Row>, String>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingExecutor {
    pub fn new(platform: &str) -> Arc<Self> {
        Arc::new(Self {
            platform: platform.to_string(),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Queues the rows returned by the next `execute`.
    pub fn respond(&self, rows: Vec<Row>) {
        self.responses.lock().unwrap().push_back(Ok(rows));
    }

    /// Queues a driver failure for the next `execute`.
    pub fn fail(&self, message: &str) {
        self.responses.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_sql(&self) -> String {
        self.calls().last().map(|(sql, _)| sql.clone()).unwrap_or_default()
    }
}

impl Executor for RecordingExecutor {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, BoxError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(message.into()),
            None => Ok(Vec::new()),
        }
    }
}

pub fn builder_with(executor: Arc<RecordingExecutor>, config: Config) -> QueryBuilder {
    aggregated::builder(Arc::new(metadata()), executor, config)
}

pub fn mysql() -> (QueryBuilder, Arc<RecordingExecutor>) {
    let executor = RecordingExecutor::new("mysql");
    (builder_with(Arc::clone(&executor), Config::default()), executor)
}

pub fn postgres() -> (QueryBuilder, Arc<RecordingExecutor>) {
    let executor = RecordingExecutor::new("postgresql");
    (builder_with(Arc::clone(&executor), Config::default()), executor)
}

/// Builds a row from a `json!` object literal.
pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("row fixture must be an object, got {other}"),
    }
}
