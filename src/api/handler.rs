use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error};

use super::error::CrudError;
use crate::config::{ModelConfig, ModelConfigs};
use crate::data::{ClientRegistry, DataError, FindManyArgs, ModelClient, UniqueWhere};
use crate::hooks::{HookContext, HookRegistry};
use crate::query::{
    build_include_clause, build_order_by_clause, build_select_clause, build_where_clause, merge_projection,
    parse_pagination, FindManyParams, DEFAULT_MAX_LIMIT,
};
use crate::sanitizer::{parse_id, sanitize_input};
use crate::schema::{get_id_field, get_model_by_name, Field, Model, Schema};
use crate::types::{CrudAction, Record};

#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub max_limit: i64,
    /// Upper bound for each data-client call
    pub data_timeout: Duration,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
            data_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated {
    pub data: Vec<Record>,
    pub meta: PageMeta,
}

/// CRUD orchestration over every model in the schema
pub struct ApiHandler {
    schema: Arc<Schema>,
    clients: ClientRegistry,
    models: ModelConfigs,
    hooks: HookRegistry,
    options: ApiOptions,
}

impl ApiHandler {
    pub fn new(
        schema: Arc<Schema>,
        clients: ClientRegistry,
        models: ModelConfigs,
        hooks: HookRegistry,
        options: ApiOptions,
    ) -> Self {
        Self {
            schema,
            clients,
            models,
            hooks,
            options,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub async fn find_many(&self, model_name: &str, params: FindManyParams) -> Result<Paginated, CrudError> {
        let (model, client) = self.resolve(model_name)?;
        let ctx = self.context(model);
        let config = self.models.get(&model.name);

        let params = self.hooks.before_find(params, ctx).await?;

        let pagination = parse_pagination(params.page, params.limit, self.options.max_limit)?;
        let order_by = build_order_by_clause(
            params.sort.as_deref(),
            params.order,
            config.and_then(|c| c.default_sort.as_ref()),
        );
        let where_clause = build_where_clause(model, params.search.as_deref(), params.filters.as_ref());
        let projection = merge_projection(
            build_select_clause(model, config.map(|c| &c.fields)),
            build_include_clause(model, params.include.as_deref()),
        );

        debug!(
            "find_many {}: where={} order={:?} skip={} take={} projection={:?}",
            model.name,
            where_clause.to_value(),
            order_by.as_ref().map(|o| o.to_value()),
            pagination.skip,
            pagination.take,
            projection
        );

        let args = FindManyArgs {
            where_clause: where_clause.clone(),
            order_by,
            skip: pagination.skip,
            take: pagination.take,
            projection,
        };

        // No snapshot isolation between the page and the count
        let (records, total) = tokio::try_join!(
            self.bounded(&model.name, client.find_many(args)),
            self.bounded(&model.name, client.count(&where_clause)),
        )?;

        let data = self.hooks.after_find(records, ctx).await?;
        let limit = pagination.limit;

        Ok(Paginated {
            data,
            meta: PageMeta {
                total,
                page: pagination.page,
                limit,
                total_pages: (total + limit - 1) / limit,
            },
        })
    }

    /// A missing record is `Ok(None)`
    pub async fn find_one(&self, model_name: &str, id: &str, include: Option<&str>) -> Result<Option<Record>, CrudError> {
        let (model, client) = self.resolve(model_name)?;
        let id_field = Self::id_field(model)?;
        let id = parse_id(model, id)?;
        let config = self.models.get(&model.name);

        let projection = merge_projection(
            build_select_clause(model, config.map(|c| &c.fields)),
            build_include_clause(model, include),
        );
        let target = UniqueWhere::new(id_field.name.clone(), id);

        self.bounded(&model.name, client.find_unique(&target, &projection))
            .await
    }

    pub async fn create(&self, model_name: &str, data: Record) -> Result<Record, CrudError> {
        let (model, client) = self.resolve(model_name)?;
        let config = self.models.get(&model.name);
        Self::check_permission(model, config, CrudAction::Create)?;
        let ctx = self.context(model);

        let data = self.hooks.before_create(data, ctx).await?;
        let data = sanitize_input(model, &data, &Self::readonly(config))?;

        let record = self.bounded(&model.name, client.create(data)).await?;
        self.hooks.after_create(&record, ctx).await?;
        Ok(record)
    }

    pub async fn update(&self, model_name: &str, id: &str, data: Record) -> Result<Record, CrudError> {
        let (model, client) = self.resolve(model_name)?;
        let id_field = Self::id_field(model)?;
        let config = self.models.get(&model.name);
        Self::check_permission(model, config, CrudAction::Update)?;
        let ctx = self.context(model);

        let id = parse_id(model, id)?;
        let data = self.hooks.before_update(&id, data, ctx).await?;
        let data = sanitize_input(model, &data, &Self::readonly(config))?;

        let target = UniqueWhere::new(id_field.name.clone(), id);
        let record = self.bounded(&model.name, client.update(&target, data)).await?;
        self.hooks.after_update(&record, ctx).await?;
        Ok(record)
    }

    pub async fn remove(&self, model_name: &str, id: &str) -> Result<Record, CrudError> {
        let (model, client) = self.resolve(model_name)?;
        let id_field = Self::id_field(model)?;
        let config = self.models.get(&model.name);
        Self::check_permission(model, config, CrudAction::Delete)?;
        let ctx = self.context(model);

        let id = parse_id(model, id)?;
        self.hooks.before_delete(&id, ctx).await?;

        let target = UniqueWhere::new(id_field.name.clone(), id.clone());
        let record = self.bounded(&model.name, client.delete(&target)).await?;
        self.hooks.after_delete(&id, ctx).await?;
        Ok(record)
    }

    fn resolve(&self, name: &str) -> Result<(&Model, Arc<dyn ModelClient>), CrudError> {
        let model = get_model_by_name(&self.schema, name).ok_or_else(|| CrudError::ModelNotFound(name.to_string()))?;
        let client = self
            .clients
            .get(&model.name)
            .ok_or_else(|| CrudError::ModelNotFound(model.name.clone()))?;
        Ok((model, client))
    }

    fn id_field(model: &Model) -> Result<&Field, CrudError> {
        get_id_field(model).ok_or_else(|| CrudError::NoIdField(model.name.clone()))
    }

    fn context<'a>(&'a self, model: &'a Model) -> HookContext<'a> {
        HookContext {
            model: &model.name,
            schema: &self.schema,
        }
    }

    /// Reads are never checked; absent config allows everything
    fn check_permission(model: &Model, config: Option<&ModelConfig>, action: CrudAction) -> Result<(), CrudError> {
        if config.map_or(true, |c| c.allows(action)) {
            Ok(())
        } else {
            Err(CrudError::PermissionDenied {
                model: model.name.clone(),
                action,
            })
        }
    }

    fn readonly(config: Option<&ModelConfig>) -> Vec<String> {
        config.map(|c| c.readonly_fields()).unwrap_or_default()
    }

    async fn bounded<T>(&self, model: &str, fut: impl Future<Output = Result<T, DataError>>) -> Result<T, CrudError> {
        match timeout(self.options.data_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(DataError::RecordNotFound)) => Err(CrudError::RecordMissing),
            Ok(Err(e)) => {
                error!("Data client error on {}: {}", model, e);
                Err(CrudError::from(e))
            }
            Err(_) => {
                error!("Data client call on {} timed out after {:?}", model, self.options.data_timeout);
                Err(CrudError::Timeout(self.options.data_timeout))
            }
        }
    }
}
