pub mod defaults;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod relation;
pub mod sql;

pub use error::DataError;
pub use memory::{InMemoryStore, MemoryModelClient};
pub use postgres::{connect_pool, PgModelClient};
pub use relation::{resolve_relation, RelationLink};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::query::{OrderBy, WhereClause};
use crate::types::{Record, RecordId};

/// Which fields of a record to return
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    /// Every scalar field
    #[default]
    Default,
    /// Every scalar field plus the named relations
    Include(Vec<String>),
    /// Exactly the named fields; relation names among them are loaded
    Select(Vec<String>),
}

/// Single-record target, keyed on the model's id field
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueWhere {
    pub field: String,
    pub id: RecordId,
}

impl UniqueWhere {
    pub fn new(field: impl Into<String>, id: RecordId) -> Self {
        Self { field: field.into(), id }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyArgs {
    pub where_clause: WhereClause,
    pub order_by: Option<OrderBy>,
    pub skip: i64,
    pub take: i64,
    pub projection: Projection,
}

/// Storage operations for one model
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>, DataError>;

    async fn count(&self, where_clause: &WhereClause) -> Result<i64, DataError>;

    async fn find_unique(&self, target: &UniqueWhere, projection: &Projection) -> Result<Option<Record>, DataError>;

    async fn create(&self, data: Record) -> Result<Record, DataError>;

    /// Fails with `RecordNotFound` when the target does not exist
    async fn update(&self, target: &UniqueWhere, data: Record) -> Result<Record, DataError>;

    /// Fails with `RecordNotFound` when the target does not exist
    async fn delete(&self, target: &UniqueWhere) -> Result<Record, DataError>;
}

/// Canonical model name to client, built once at startup
#[derive(Default, Clone)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.clients.insert(model.into(), client);
    }

    pub fn get(&self, canonical_name: &str) -> Option<Arc<dyn ModelClient>> {
        self.clients.get(canonical_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
