// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::api::CrudError;
use crate::auth::{AuthError, CredentialsError};
use crate::data::DataError;
use crate::hooks::HookError;
use crate::query::QueryError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// The data API and auth routes before setup has run
    pub fn not_configured() -> Self {
        ApiError::service_unavailable("Not configured")
    }
}

// Convert other error types to ApiError
impl From<CrudError> for ApiError {
    fn from(err: CrudError) -> Self {
        match err {
            CrudError::ModelNotFound(_) | CrudError::NoIdField(_) => ApiError::not_found(err.to_string()),
            CrudError::PermissionDenied { .. } => ApiError::forbidden(err.to_string()),
            CrudError::Validation(msg) => ApiError::validation_error(msg, None),
            CrudError::RecordMissing => ApiError::not_found("Record not found"),
            CrudError::Hook(e) => e.into(),
            CrudError::Data(e) => e.into(),
            CrudError::Timeout(after) => {
                tracing::error!("Data operation timed out after {:?}", after);
                ApiError::service_unavailable("Data source did not respond in time")
            }
        }
    }
}

impl From<HookError> for ApiError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Validation(msg) => ApiError::validation_error(msg, None),
            HookError::Denied(msg) => ApiError::forbidden(msg),
            HookError::Failed(msg) => {
                tracing::error!("Hook failed: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            HookError::Timeout { hook, millis } => {
                tracing::error!("Hook '{}' timed out after {}ms", hook, millis);
                ApiError::internal_server_error("Request processing timed out")
            }
        }
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::RecordNotFound => ApiError::not_found("Record not found"),
            DataError::UnknownField { model, field } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(field.clone(), format!("Unknown field on {}", model));
                ApiError::validation_error(format!("Unknown field '{}'", field), Some(field_errors))
            }
            DataError::UniqueViolation { model, field } => {
                ApiError::conflict(format!("A {} with this {} already exists", model, field))
            }
            DataError::InvalidData(msg) => ApiError::validation_error(msg, None),
            DataError::Query(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Data query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DataError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::validation_error(err.to_string(), None)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotConfigured => ApiError::not_configured(),
            AuthError::TokenGeneration(msg) => {
                tracing::error!("Token generation failed: {}", msg);
                ApiError::internal_server_error("Could not issue token")
            }
        }
    }
}

impl From<CredentialsError> for ApiError {
    fn from(err: CredentialsError) -> Self {
        match err {
            CredentialsError::AlreadyConfigured
            | CredentialsError::SetupUnavailable
            | CredentialsError::MissingFields
            | CredentialsError::PasswordTooShort(_) => ApiError::bad_request(err.to_string()),
            CredentialsError::Io { path, source } => {
                tracing::error!("Credentials file {}: {}", path.display(), source);
                ApiError::internal_server_error("Could not save credentials")
            }
            CredentialsError::Json(e) => {
                tracing::error!("Credentials file is malformed: {}", e);
                ApiError::internal_server_error("Could not read credentials")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
