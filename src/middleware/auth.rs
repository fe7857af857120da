use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::cookies::{read_cookie, ACCESS_COOKIE};
use crate::app::AppState;
use crate::error::ApiError;

/// Validates the access token and injects `AuthUser` and `Claims` into the request.
///
/// The token is read from `Authorization: Bearer` first, then from the
/// `prada_token` cookie. Refresh tokens are rejected here.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(service) = state.gate.service().await else {
        return ApiError::not_configured().into_response();
    };

    let Some(token) = extract_token(&headers) else {
        return ApiError::unauthorized("Unauthorized").into_response();
    };

    let Some(claims) = service.verify_access_token(&token) else {
        tracing::debug!("Rejected access token");
        return ApiError::unauthorized("Invalid or expired token").into_response();
    };

    request.extensions_mut().insert(claims.user());
    request.extensions_mut().insert(claims);

    next.run(request).await
}

/// Bearer header wins over the cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| read_cookie(headers, ACCESS_COOKIE))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
