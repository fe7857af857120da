use std::time::Duration;

use thiserror::Error;

use crate::data::DataError;
use crate::hooks::HookError;
use crate::query::QueryError;
use crate::sanitizer::SanitizeError;
use crate::types::CrudAction;

/// Failures of a CRUD operation, tagged by kind
#[derive(Debug, Error)]
pub enum CrudError {
    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error("Model {0} has no id field")]
    NoIdField(String),

    #[error("Action '{action}' is not allowed on {model}")]
    PermissionDenied { model: String, action: CrudAction },

    #[error("{0}")]
    Validation(String),

    #[error("Record not found")]
    RecordMissing,

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Data(DataError),

    #[error("Data operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<DataError> for CrudError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::RecordNotFound => CrudError::RecordMissing,
            other => CrudError::Data(other),
        }
    }
}

impl From<SanitizeError> for CrudError {
    fn from(err: SanitizeError) -> Self {
        match err {
            SanitizeError::NoIdField(model) => CrudError::NoIdField(model),
            other => CrudError::Validation(other.to_string()),
        }
    }
}

impl From<QueryError> for CrudError {
    fn from(err: QueryError) -> Self {
        CrudError::Validation(err.to_string())
    }
}
