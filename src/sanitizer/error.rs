use thiserror::Error;

/// A value that cannot be converted to its field's semantic type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    #[error("'{0}' is not a valid date")]
    InvalidDate(String),

    #[error("'{0}' is not a valid integer")]
    InvalidBigInt(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SanitizeError {
    #[error("Invalid value for field '{field}': {source}")]
    Conversion {
        field: String,
        #[source]
        source: ConversionError,
    },

    #[error("Model \"{0}\" has no id field")]
    NoIdField(String),

    #[error("Invalid id '{value}' for model \"{model}\"")]
    InvalidId { model: String, value: String },
}
