use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// Errors surfaced by model clients
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Record not found")]
    RecordNotFound,

    #[error("Unknown field '{field}' on model {model}")]
    UnknownField { model: String, field: String },

    #[error("Unique constraint failed on {model}.{field}")]
    UniqueViolation { model: String, field: String },

    /// Rejected by the database: bad references, missing values, unparseable input
    #[error("{0}")]
    InvalidData(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl DataError {
    pub fn unknown_field(model: &str, field: &str) -> Self {
        DataError::UnknownField {
            model: model.to_string(),
            field: field.to_string(),
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        let mapped = match &err {
            sqlx::Error::Database(db) => db.try_downcast_ref::<PgDatabaseError>().and_then(|pg| {
                classify_pg_error(pg.code(), pg.table(), pg.constraint(), pg.detail(), pg.message())
            }),
            _ => None,
        };
        mapped.unwrap_or(DataError::Sqlx(err))
    }
}

/// Map the SQLSTATEs a client can cause to typed errors; anything else stays opaque
pub fn classify_pg_error(
    code: &str,
    table: Option<&str>,
    constraint: Option<&str>,
    detail: Option<&str>,
    message: &str,
) -> Option<DataError> {
    match code {
        // unique_violation
        "23505" => Some(DataError::UniqueViolation {
            model: table.unwrap_or("record").to_string(),
            field: detail
                .and_then(key_columns)
                .or(constraint)
                .unwrap_or("unique key")
                .to_string(),
        }),
        // foreign_key_violation
        "23503" => Some(DataError::InvalidData(detail.unwrap_or(message).to_string())),
        // not_null_violation, check_violation
        "23502" | "23514" => Some(DataError::InvalidData(message.to_string())),
        // invalid_text_representation, invalid datetime format, datetime out of range,
        // numeric out of range, invalid enum value
        "22P02" | "22007" | "22008" | "22003" | "22P05" => Some(DataError::InvalidData(message.to_string())),
        _ => None,
    }
}

/// Column list out of a "Key (a, b)=(...) already exists." detail line
fn key_columns(detail: &str) -> Option<&str> {
    let rest = detail.strip_prefix("Key (")?;
    let end = rest.find(")=")?;
    Some(&rest[..end])
}
