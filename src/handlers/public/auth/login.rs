// handlers/public/auth/login.rs - POST /api/auth/login

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::utils::{access_cookie, refresh_cookie, require_service};
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::utils::json_body;
use crate::middleware::cookies::append_cookies;
use crate::middleware::ApiResponse;

/// `email` and `login` are interchangeable; `email` wins when both are sent
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    fn identity(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.login.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: AuthUser,
    pub access_token: String,
}

/// Validates credentials, sets both session cookies and returns the access token.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let service = require_service(&state).await?;
    let request = json_body(payload)?;

    let (Some(login), Some(password)) = (request.identity(), request.password.as_deref().filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let Some(user) = service.validate_credentials(login, password) else {
        tracing::warn!("Failed login attempt for '{}'", login);
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let tokens = service.generate_tokens(&user)?;
    tracing::info!("Login succeeded for '{}'", user.email);

    let mut headers = HeaderMap::new();
    append_cookies(
        &mut headers,
        [
            access_cookie(&state, &tokens.access_token),
            refresh_cookie(&state, &tokens.refresh_token),
        ],
    );

    let body = ApiResponse::success(LoginResponse {
        user,
        access_token: tokens.access_token,
    });
    Ok((headers, body).into_response())
}
