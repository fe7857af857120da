use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::data::{
    ClientRegistry, DataError, FindManyArgs, InMemoryStore, ModelClient, Projection, UniqueWhere,
};
use crate::query::WhereClause;
use crate::schema::{parse_datamodel, Schema};
use crate::types::Record;

const BLOG_DATAMODEL: &str = include_str!("../../tests/fixtures/blog.json");

/// User/Post/Comment/Setting fixture shared by unit tests
pub fn blog_schema() -> Schema {
    let raw = serde_json::from_str(BLOG_DATAMODEL).expect("fixture datamodel is valid JSON");
    parse_datamodel(raw).expect("fixture datamodel parses")
}

/// Model client that remembers every payload handed to `create` and `update`
/// before delegating to an inner client
pub struct RecordingClient {
    inner: Arc<dyn ModelClient>,
    pub created: Mutex<Vec<Record>>,
    pub updated: Mutex<Vec<Record>>,
}

impl RecordingClient {
    pub fn new(inner: Arc<dyn ModelClient>) -> Self {
        Self {
            inner,
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<Record> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<Record> {
        self.updated.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for RecordingClient {
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>, DataError> {
        self.inner.find_many(args).await
    }

    async fn count(&self, where_clause: &WhereClause) -> Result<i64, DataError> {
        self.inner.count(where_clause).await
    }

    async fn find_unique(&self, target: &UniqueWhere, projection: &Projection) -> Result<Option<Record>, DataError> {
        self.inner.find_unique(target, projection).await
    }

    async fn create(&self, data: Record) -> Result<Record, DataError> {
        self.created.lock().unwrap().push(data.clone());
        self.inner.create(data).await
    }

    async fn update(&self, target: &UniqueWhere, data: Record) -> Result<Record, DataError> {
        self.updated.lock().unwrap().push(data.clone());
        self.inner.update(target, data).await
    }

    async fn delete(&self, target: &UniqueWhere) -> Result<Record, DataError> {
        self.inner.delete(target).await
    }
}

/// In-memory clients for every model in the fixture schema
pub fn memory_clients(schema: &Arc<Schema>) -> (InMemoryStore, ClientRegistry) {
    let store = InMemoryStore::new(schema.clone());
    let clients = store.client_registry();
    (store, clients)
}
