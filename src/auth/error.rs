use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Authentication is not configured")]
    NotConfigured,
}

/// Failures reading or writing the persisted credentials file
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Already configured")]
    AlreadyConfigured,

    #[error("Setup not available")]
    SetupUnavailable,

    #[error("Login and password are required")]
    MissingFields,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credentials file: {0}")]
    Json(#[from] serde_json::Error),
}
