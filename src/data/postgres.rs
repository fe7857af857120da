use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::QueryScalar;
use sqlx::{PgPool, Postgres};
use tracing::{debug, info};

use super::defaults::{fill_create_defaults, touch_updated_at};
use super::error::DataError;
use super::sql::{SqlBuilder, SqlParam, SqlStatement};
use super::{ClientRegistry, FindManyArgs, ModelClient, Projection, UniqueWhere};
use crate::config::DatabaseConfig;
use crate::query::WhereClause;
use crate::schema::{get_model_by_name, Model, Schema};
use crate::types::Record;

/// Open the shared connection pool
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, DataError> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| DataError::Query("DATABASE_URL is not set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("Connected to database (max {} connections)", config.max_connections);
    Ok(pool)
}

/// Model client backed by one Postgres table
pub struct PgModelClient {
    pool: PgPool,
    schema: Arc<Schema>,
    model: String,
    namespace: String,
}

impl PgModelClient {
    pub fn new(pool: PgPool, schema: Arc<Schema>, model: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            schema,
            model: model.into(),
            namespace: namespace.into(),
        }
    }

    /// One client per model, all sharing the pool
    pub fn registry(pool: &PgPool, schema: &Arc<Schema>, namespace: &str) -> ClientRegistry {
        let mut clients = ClientRegistry::new();
        for model in &schema.models {
            clients.insert(
                model.name.clone(),
                Arc::new(PgModelClient::new(pool.clone(), schema.clone(), model.name.clone(), namespace)),
            );
        }
        clients
    }

    fn model(&self) -> Result<&Model, DataError> {
        get_model_by_name(&self.schema, &self.model)
            .ok_or_else(|| DataError::Query(format!("Model {} is not in the schema", self.model)))
    }

    fn builder(&self) -> Result<SqlBuilder<'_>, DataError> {
        Ok(SqlBuilder::new(&self.schema, self.model()?, &self.namespace))
    }

    async fn fetch_all(&self, stmt: SqlStatement) -> Result<Vec<Record>, DataError> {
        debug!("{} SQL: {}", self.model, stmt.query);
        let rows: Vec<Value> = bind_params(sqlx::query_scalar(&stmt.query), &stmt.params)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(into_record).collect()
    }

    async fn fetch_optional(&self, stmt: SqlStatement) -> Result<Option<Record>, DataError> {
        debug!("{} SQL: {}", self.model, stmt.query);
        let row: Option<Value> = bind_params(sqlx::query_scalar(&stmt.query), &stmt.params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_record).transpose()
    }
}

#[async_trait]
impl ModelClient for PgModelClient {
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>, DataError> {
        let stmt = self.builder()?.select(&args)?;
        self.fetch_all(stmt).await
    }

    async fn count(&self, where_clause: &WhereClause) -> Result<i64, DataError> {
        let stmt = self.builder()?.count(where_clause)?;
        debug!("{} SQL: {}", self.model, stmt.query);
        let count: i64 = bind_params(sqlx::query_scalar(&stmt.query), &stmt.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_unique(&self, target: &UniqueWhere, projection: &Projection) -> Result<Option<Record>, DataError> {
        let stmt = self.builder()?.find_unique(target, projection)?;
        self.fetch_optional(stmt).await
    }

    async fn create(&self, mut data: Record) -> Result<Record, DataError> {
        fill_create_defaults(self.model()?, &mut data, false);
        let stmt = self.builder()?.insert(&data)?;
        self.fetch_optional(stmt)
            .await?
            .ok_or_else(|| DataError::Query("INSERT returned no row".to_string()))
    }

    async fn update(&self, target: &UniqueWhere, mut data: Record) -> Result<Record, DataError> {
        if data.is_empty() {
            return self
                .find_unique(target, &Projection::Default)
                .await?
                .ok_or(DataError::RecordNotFound);
        }
        touch_updated_at(self.model()?, &mut data);
        let stmt = self.builder()?.update(target, &data)?;
        self.fetch_optional(stmt).await?.ok_or(DataError::RecordNotFound)
    }

    async fn delete(&self, target: &UniqueWhere) -> Result<Record, DataError> {
        let stmt = self.builder()?.delete(target)?;
        self.fetch_optional(stmt).await?.ok_or(DataError::RecordNotFound)
    }
}

fn into_record(value: Value) -> Result<Record, DataError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DataError::Query(format!("Expected a JSON object row, got {}", other))),
    }
}

fn bind_params<'q, O>(
    mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for param in params {
        q = match param {
            SqlParam::Text(s) => q.bind(s.clone()),
            SqlParam::Int(i) => q.bind(*i),
            SqlParam::Json(v) => q.bind(v.clone()),
        };
    }
    q
}
