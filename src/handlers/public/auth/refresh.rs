// handlers/public/auth/refresh.rs - POST /api/auth/refresh

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::utils::{access_cookie, clear_session_headers, require_service};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::cookies::{append_cookies, read_cookie, REFRESH_COOKIE};
use crate::middleware::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Exchange the refresh cookie for a new access token.
///
/// An invalid refresh token also clears both cookies.
pub async fn post(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let service = require_service(&state).await?;

    let Some(token) = read_cookie(&headers, REFRESH_COOKIE) else {
        return Err(ApiError::unauthorized("No refresh token"));
    };

    let Some(claims) = service.verify_refresh_token(&token) else {
        tracing::debug!("Rejected refresh token");
        let cleared = clear_session_headers(&state);
        return Ok((cleared, ApiError::unauthorized("Invalid refresh token")).into_response());
    };

    let access_token = service.generate_access_token(&claims.user())?;

    let mut out = HeaderMap::new();
    append_cookies(&mut out, [access_cookie(&state, &access_token)]);
    Ok((out, ApiResponse::success(RefreshResponse { access_token })).into_response())
}
