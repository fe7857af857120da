use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use super::error::ConversionError;
use crate::schema::FieldType;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Coerce an untyped input value to the field's semantic type.
/// Null always passes through unchanged.
pub fn convert_field_value(field_type: FieldType, value: Value) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Ok(value);
    }

    match field_type {
        FieldType::Number => match value {
            Value::String(s) => parse_number(&s),
            other => Ok(other),
        },
        FieldType::Boolean => Ok(Value::Bool(match &value {
            Value::String(s) => s == "true",
            other => truthy(other),
        })),
        FieldType::Date => to_date(&value),
        FieldType::BigInt => to_bigint(&value),
        FieldType::Json => match value {
            Value::String(s) => {
                serde_json::from_str(&s).map_err(|e| ConversionError::InvalidJson(e.to_string()))
            }
            other => Ok(other),
        },
        _ => Ok(value),
    }
}

fn parse_number(s: &str) -> Result<Value, ConversionError> {
    let parsed: f64 = s
        .trim()
        .parse()
        .map_err(|_| ConversionError::InvalidNumber(s.to_string()))?;

    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        return Ok(Value::from(parsed as i64));
    }
    Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| ConversionError::InvalidNumber(s.to_string()))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_date(value: &Value) -> Result<Value, ConversionError> {
    let parsed = match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    };

    parsed
        .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
        .ok_or_else(|| ConversionError::InvalidDate(display(value)))
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn to_bigint(value: &Value) -> Result<Value, ConversionError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };

    parsed
        .map(Value::from)
        .ok_or_else(|| ConversionError::InvalidBigInt(display(value)))
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
