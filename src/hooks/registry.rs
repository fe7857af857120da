// Ordered hook registry
//
// Hooks are stored as (matcher, hook) pairs. For a given model the wildcard
// hooks run first, then the model-specific ones, each group in registration
// order. Transforming hooks thread their output into the next hook.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use super::error::HookError;
use super::traits::{CrudHooks, HookContext};
use crate::query::FindManyParams;
use crate::types::{Record, RecordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelMatcher {
    /// Matches every model
    Any,
    /// Matches one model, case-insensitively
    Model(String),
}

impl ModelMatcher {
    pub fn matches(&self, model: &str) -> bool {
        match self {
            ModelMatcher::Any => true,
            ModelMatcher::Model(name) => name.eq_ignore_ascii_case(model),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, ModelMatcher::Any)
    }
}

impl From<&str> for ModelMatcher {
    /// `"*"` is the wildcard; anything else names a model
    fn from(key: &str) -> Self {
        if key == "*" {
            ModelMatcher::Any
        } else {
            ModelMatcher::Model(key.to_string())
        }
    }
}

#[derive(Default, Clone)]
pub struct HookRegistry {
    entries: Vec<(ModelMatcher, Arc<dyn CrudHooks>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, matcher: impl Into<ModelMatcher>, hook: Arc<dyn CrudHooks>) -> &mut Self {
        let matcher = matcher.into();
        tracing::debug!("Registered hook '{}' for {:?}", hook.name(), matcher);
        self.entries.push((matcher, hook));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hooks that apply to `model`, wildcard first
    pub fn hooks_for(&self, model: &str) -> Vec<Arc<dyn CrudHooks>> {
        let wildcard = self
            .entries
            .iter()
            .filter(|(m, _)| m.is_wildcard());
        let specific = self
            .entries
            .iter()
            .filter(|(m, _)| !m.is_wildcard() && m.matches(model));

        wildcard.chain(specific).map(|(_, h)| h.clone()).collect()
    }

    pub async fn before_find(&self, mut params: FindManyParams, ctx: HookContext<'_>) -> Result<FindManyParams, HookError> {
        for hook in self.hooks_for(ctx.model) {
            params = run_bounded(hook.as_ref(), "before_find", ctx, hook.before_find(params, ctx)).await?;
        }
        Ok(params)
    }

    pub async fn after_find(&self, mut records: Vec<Record>, ctx: HookContext<'_>) -> Result<Vec<Record>, HookError> {
        for hook in self.hooks_for(ctx.model) {
            records = run_bounded(hook.as_ref(), "after_find", ctx, hook.after_find(records, ctx)).await?;
        }
        Ok(records)
    }

    pub async fn before_create(&self, mut data: Record, ctx: HookContext<'_>) -> Result<Record, HookError> {
        for hook in self.hooks_for(ctx.model) {
            data = run_bounded(hook.as_ref(), "before_create", ctx, hook.before_create(data, ctx)).await?;
        }
        Ok(data)
    }

    pub async fn after_create(&self, record: &Record, ctx: HookContext<'_>) -> Result<(), HookError> {
        for hook in self.hooks_for(ctx.model) {
            run_bounded(hook.as_ref(), "after_create", ctx, hook.after_create(record, ctx)).await?;
        }
        Ok(())
    }

    pub async fn before_update(&self, id: &RecordId, mut data: Record, ctx: HookContext<'_>) -> Result<Record, HookError> {
        for hook in self.hooks_for(ctx.model) {
            data = run_bounded(hook.as_ref(), "before_update", ctx, hook.before_update(id, data, ctx)).await?;
        }
        Ok(data)
    }

    pub async fn after_update(&self, record: &Record, ctx: HookContext<'_>) -> Result<(), HookError> {
        for hook in self.hooks_for(ctx.model) {
            run_bounded(hook.as_ref(), "after_update", ctx, hook.after_update(record, ctx)).await?;
        }
        Ok(())
    }

    pub async fn before_delete(&self, id: &RecordId, ctx: HookContext<'_>) -> Result<(), HookError> {
        for hook in self.hooks_for(ctx.model) {
            run_bounded(hook.as_ref(), "before_delete", ctx, hook.before_delete(id, ctx)).await?;
        }
        Ok(())
    }

    pub async fn after_delete(&self, id: &RecordId, ctx: HookContext<'_>) -> Result<(), HookError> {
        for hook in self.hooks_for(ctx.model) {
            run_bounded(hook.as_ref(), "after_delete", ctx, hook.after_delete(id, ctx)).await?;
        }
        Ok(())
    }
}

/// Run one hook call under its timeout, logging the outcome
async fn run_bounded<T>(
    hook: &dyn CrudHooks,
    point: &'static str,
    ctx: HookContext<'_>,
    fut: impl Future<Output = Result<T, HookError>>,
) -> Result<T, HookError> {
    let limit: Duration = hook.timeout();
    let started = Instant::now();

    match timeout(limit, fut).await {
        Ok(Ok(value)) => {
            tracing::debug!(
                "Hook '{}' {} on {} completed in {:?}",
                hook.name(),
                point,
                ctx.model,
                started.elapsed()
            );
            Ok(value)
        }
        Ok(Err(e)) => {
            tracing::warn!("Hook '{}' {} on {} failed: {}", hook.name(), point, ctx.model, e);
            Err(e)
        }
        Err(_) => {
            tracing::error!("Hook '{}' {} on {} timed out after {:?}", hook.name(), point, ctx.model, limit);
            Err(HookError::Timeout {
                hook: hook.name().to_string(),
                millis: limit.as_millis(),
            })
        }
    }
}
