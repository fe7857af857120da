use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct SetupStatus {
    pub configured: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SetupRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SetupResult {
    pub success: bool,
    pub message: &'static str,
}

/// GET /api/setup/status
pub async fn status_get(State(state): State<AppState>) -> ApiResult<SetupStatus> {
    Ok(ApiResponse::success(SetupStatus {
        configured: state.gate.is_configured().await,
    }))
}

/// POST /api/setup/init - persist first-run credentials
pub async fn init_post(
    State(state): State<AppState>,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> ApiResult<SetupResult> {
    let request = json_body(payload)?;
    state.gate.setup(request.login.trim(), &request.password).await?;

    Ok(ApiResponse::success(SetupResult {
        success: true,
        message: "Credentials saved",
    }))
}
