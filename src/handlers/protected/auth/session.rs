use axum::Extension;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
}

/// GET /api/auth/me - the principal behind the current access token
pub async fn me(Extension(user): Extension<AuthUser>) -> ApiResult<MeResponse> {
    Ok(ApiResponse::success(MeResponse { user }))
}
