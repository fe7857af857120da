use std::sync::Arc;

use axum::http::HeaderMap;

use crate::app::AppState;
use crate::auth::AuthService;
use crate::error::ApiError;
use crate::middleware::cookies::{cleared_cookie, session_cookie, ACCESS_COOKIE, REFRESH_COOKIE};

/// The installed auth service, or 503 before setup
pub async fn require_service(state: &AppState) -> Result<Arc<AuthService>, ApiError> {
    state.gate.service().await.ok_or_else(ApiError::not_configured)
}

pub fn access_cookie(state: &AppState, token: &str) -> String {
    let security = &state.config.security;
    session_cookie(ACCESS_COOKIE, token, security.access_token_ttl_secs, security.secure_cookies)
}

pub fn refresh_cookie(state: &AppState, token: &str) -> String {
    let security = &state.config.security;
    session_cookie(REFRESH_COOKIE, token, security.refresh_token_ttl_secs, security.secure_cookies)
}

/// Headers that expire both session cookies
pub fn clear_session_headers(state: &AppState) -> HeaderMap {
    let secure = state.config.security.secure_cookies;
    let mut headers = HeaderMap::new();
    crate::middleware::cookies::append_cookies(
        &mut headers,
        [cleared_cookie(ACCESS_COOKIE, secure), cleared_cookie(REFRESH_COOKIE, secure)],
    );
    headers
}
