pub mod convert;
pub mod error;

pub use convert::convert_field_value;
pub use error::{ConversionError, SanitizeError};

use crate::schema::{get_id_field, get_required_fields, get_scalar_fields, FieldType, Model};
use crate::types::{Record, RecordId};

/// Allow-list the payload against the model's writable scalar fields.
///
/// Keys that are not scalar fields, readonly fields, and auto-generated ids
/// are dropped silently. Kept values are converted to their field type.
pub fn sanitize_input(model: &Model, data: &Record, readonly: &[String]) -> Result<Record, SanitizeError> {
    let mut out = Record::new();

    for field in get_scalar_fields(model) {
        if readonly.iter().any(|r| r == &field.name) || (field.is_id && field.has_default_value) {
            continue;
        }
        let Some(value) = data.get(&field.name) else { continue };

        let converted = convert_field_value(field.field_type, value.clone()).map_err(|source| {
            SanitizeError::Conversion {
                field: field.name.clone(),
                source,
            }
        })?;
        out.insert(field.name.clone(), converted);
    }

    Ok(out)
}

/// Names of required fields missing from the payload. Not run automatically.
pub fn validate_required(model: &Model, data: &Record) -> Vec<String> {
    get_required_fields(model)
        .into_iter()
        .filter(|f| !data.contains_key(&f.name))
        .map(|f| format!("{} is required", f.name))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub check_required: bool,
    pub allowed_fields: Option<Vec<String>>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            check_required: true,
            allowed_fields: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_input(model: &Model, data: &Record, options: &ValidateOptions) -> ValidationReport {
    let mut errors = Vec::new();

    if options.check_required {
        errors.extend(validate_required(model, data));
    }

    if let Some(allowed) = &options.allowed_fields {
        errors.extend(
            data.keys()
                .filter(|k| !allowed.contains(k))
                .map(|k| format!("Unknown field: {}", k)),
        );
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Parse a raw path id against the model's id field. Numeric ids must be
/// base-10 integers; every other id type is kept as text.
pub fn parse_id(model: &Model, raw: &str) -> Result<RecordId, SanitizeError> {
    let id_field = get_id_field(model).ok_or_else(|| SanitizeError::NoIdField(model.name.clone()))?;

    match id_field.field_type {
        FieldType::Number | FieldType::BigInt => raw
            .trim()
            .parse::<i64>()
            .map(RecordId::Int)
            .map_err(|_| SanitizeError::InvalidId {
                model: model.name.clone(),
                value: raw.to_string(),
            }),
        _ => Ok(RecordId::Text(raw.to_string())),
    }
}
