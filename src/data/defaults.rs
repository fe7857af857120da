use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{get_scalar_fields, Model};
use crate::types::Record;

/// Current time in the format the sanitizer produces for date fields
pub fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Values for generators that are evaluated by the client rather than the
/// database. `autoincrement` and `dbgenerated` belong to storage.
pub fn client_generated(generator: &str) -> Option<Value> {
    match generator {
        "uuid" => Some(Value::String(Uuid::new_v4().to_string())),
        "cuid" => Some(Value::String(format!("c{}", Uuid::new_v4().simple()))),
        "now" => Some(now_timestamp()),
        _ => None,
    }
}

/// Fill client-side ids and `@updatedAt` stamps on a create payload.
/// `now()` is left to the database unless `include_now` is set.
pub fn fill_create_defaults(model: &Model, data: &mut Record, include_now: bool) {
    for field in get_scalar_fields(model) {
        if data.contains_key(&field.name) {
            continue;
        }
        if field.is_updated_at {
            data.insert(field.name.clone(), now_timestamp());
            continue;
        }
        match field.default_generator() {
            Some("now") if !include_now => {}
            Some(generator) => {
                if let Some(value) = client_generated(generator) {
                    data.insert(field.name.clone(), value);
                }
            }
            None => {}
        }
    }
}

/// Stamp `@updatedAt` fields the caller did not set
pub fn touch_updated_at(model: &Model, data: &mut Record) {
    for field in get_scalar_fields(model) {
        if field.is_updated_at && !data.contains_key(&field.name) {
            data.insert(field.name.clone(), now_timestamp());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::get_model_by_name;
    use crate::testing::blog_schema;

    #[test]
    fn create_fills_uuid_ids_and_updated_at() {
        let schema = blog_schema();
        let comment = get_model_by_name(&schema, "Comment").unwrap();
        let mut data = Record::new();
        fill_create_defaults(comment, &mut data, false);
        assert!(Uuid::parse_str(data["id"].as_str().unwrap()).is_ok());

        let post = get_model_by_name(&schema, "Post").unwrap();
        let mut data = Record::new();
        fill_create_defaults(post, &mut data, false);
        assert!(data.contains_key("updatedAt"));
        assert!(!data.contains_key("createdAt"));
        assert!(!data.contains_key("id"));

        let mut data = Record::new();
        fill_create_defaults(post, &mut data, true);
        assert!(data["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn explicit_values_are_kept() {
        let schema = blog_schema();
        let post = get_model_by_name(&schema, "Post").unwrap();
        let mut data = Record::new();
        data.insert("updatedAt".into(), Value::String("2020-01-01T00:00:00.000Z".into()));
        touch_updated_at(post, &mut data);
        assert_eq!(data["updatedAt"], "2020-01-01T00:00:00.000Z");
    }
}
