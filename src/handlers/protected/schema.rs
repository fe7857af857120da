use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::Schema;

/// GET /api/schema - the full schema the API was generated from
pub async fn schema_get(State(state): State<AppState>) -> ApiResult<Schema> {
    Ok(ApiResponse::success(state.handler.schema().as_ref().clone()))
}
