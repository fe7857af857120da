use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;

use super::utils::{expect_object, list_params};
use crate::app::AppState;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Record;

/// GET /api/:model - paginated list
///
/// Recognized keys are `page`, `limit`, `sort`, `order`, `search` and
/// `include`; every other query key becomes an exact-match filter.
pub async fn get(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Record>> {
    let params = list_params(query)?;
    let page = state.handler.find_many(&model, params).await?;
    Ok(ApiResponse::success(page.data).with_meta(page.meta))
}

/// POST /api/:model - create one record
pub async fn post(
    State(state): State<AppState>,
    Path(model): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Record> {
    let data = expect_object(json_body(payload)?)?;
    let record = state.handler.create(&model, data).await?;
    Ok(ApiResponse::created(record))
}
