use thiserror::Error;

/// Hook failures with structured error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HookError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Denied: {0}")]
    Denied(String),

    #[error("Hook failed: {0}")]
    Failed(String),

    #[error("Hook '{hook}' timed out after {millis}ms")]
    Timeout { hook: String, millis: u128 },
}
