use std::time::Duration;

use async_trait::async_trait;

use super::error::HookError;
use crate::query::FindManyParams;
use crate::schema::Schema;
use crate::types::{Record, RecordId};

/// What a hook knows about the call it is wrapping
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Canonical model name
    pub model: &'a str,
    pub schema: &'a Schema,
}

/// Lifecycle hooks around CRUD operations.
///
/// Every method has a pass-through default, so implementors override only
/// the points they care about. Before-hooks and `after_find` may transform
/// the value they receive. The after-hooks of create, update and delete only
/// observe.
#[async_trait]
pub trait CrudHooks: Send + Sync {
    /// Hook name for logging and debugging
    fn name(&self) -> &'static str;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn before_find(&self, params: FindManyParams, _ctx: HookContext<'_>) -> Result<FindManyParams, HookError> {
        Ok(params)
    }

    async fn after_find(&self, records: Vec<Record>, _ctx: HookContext<'_>) -> Result<Vec<Record>, HookError> {
        Ok(records)
    }

    async fn before_create(&self, data: Record, _ctx: HookContext<'_>) -> Result<Record, HookError> {
        Ok(data)
    }

    async fn after_create(&self, _record: &Record, _ctx: HookContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    async fn before_update(&self, _id: &RecordId, data: Record, _ctx: HookContext<'_>) -> Result<Record, HookError> {
        Ok(data)
    }

    async fn after_update(&self, _record: &Record, _ctx: HookContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    async fn before_delete(&self, _id: &RecordId, _ctx: HookContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    async fn after_delete(&self, _id: &RecordId, _ctx: HookContext<'_>) -> Result<(), HookError> {
        Ok(())
    }
}
