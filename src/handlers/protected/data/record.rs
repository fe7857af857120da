use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::utils::expect_object;
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Record;

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub include: Option<String>,
}

/// GET /api/:model/:id
pub async fn get(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Record> {
    state
        .handler
        .find_one(&model, &id, query.include.as_deref())
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// PUT /api/:model/:id - partial update, absent fields are untouched
pub async fn put(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Record> {
    let data = expect_object(json_body(payload)?)?;
    let record = state.handler.update(&model, &id, data).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/:model/:id - returns the removed record
pub async fn delete(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
) -> ApiResult<Record> {
    let record = state.handler.remove(&model, &id).await?;
    Ok(ApiResponse::success(record))
}
