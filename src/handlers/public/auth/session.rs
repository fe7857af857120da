use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::utils::clear_session_headers;
use crate::app::AppState;
use crate::middleware::ApiResponse;

/// POST /api/auth/logout - clears both cookies; tokens are stateless and stay valid until expiry
pub async fn logout(State(state): State<AppState>) -> Response {
    (clear_session_headers(&state), ApiResponse::success(json!({ "success": true }))).into_response()
}
