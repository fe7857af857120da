use thiserror::Error;

/// Failures while building the schema snapshot. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid datamodel: {0}")]
    InvalidDatamodel(String),

    #[error("Enum '{0}' has no values")]
    EmptyEnum(String),

    #[error("Introspection failed: {0}")]
    Introspection(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
