use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::query::{FindManyParams, QueryError};
use crate::types::{Record, SortOrder};

const RESERVED_KEYS: [&str; 6] = ["page", "limit", "sort", "order", "search", "include"];

/// Split the raw query string into list parameters and filters
pub fn list_params(mut query: HashMap<String, String>) -> Result<FindManyParams, ApiError> {
    let page = parse_int(query.remove("page"), "page")?;
    let limit = parse_int(query.remove("limit"), "limit")?;
    let order = query
        .remove("order")
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SortOrder>().map_err(QueryError::InvalidOrder))
        .transpose()?;

    let mut params = FindManyParams {
        page,
        limit,
        order,
        sort: query.remove("sort").filter(|s| !s.is_empty()),
        search: query.remove("search"),
        include: query.remove("include"),
        filters: None,
    };

    let filters: Map<String, Value> = query
        .into_iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    if !filters.is_empty() {
        params.filters = Some(filters);
    }

    Ok(params)
}

fn parse_int(raw: Option<String>, name: &str) -> Result<Option<i64>, QueryError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.trim().parse::<i64>().map(Some).map_err(|_| {
        let msg = format!("{} must be an integer, got '{}'", name, raw);
        if name == "page" {
            QueryError::InvalidPage(msg)
        } else {
            QueryError::InvalidLimit(msg)
        }
    })
}

/// Create and update bodies must be JSON objects
pub fn expect_object(body: Value) -> Result<Record, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::bad_request(format!(
            "Request body must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let params = list_params(query(&[
            ("page", "2"),
            ("limit", "10"),
            ("sort", "title"),
            ("order", "DESC"),
            ("search", "rust"),
            ("include", "author"),
            ("published", "true"),
        ]))
        .unwrap();

        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(10));
        assert_eq!(params.sort.as_deref(), Some("title"));
        assert_eq!(params.order, Some(SortOrder::Desc));
        assert_eq!(params.search.as_deref(), Some("rust"));
        assert_eq!(params.include.as_deref(), Some("author"));
        assert_eq!(params.filters.unwrap(), json!({"published": "true"}).as_object().unwrap().clone());
    }

    #[test]
    fn invalid_numbers_and_order_are_rejected() {
        for pairs in [[("page", "two")], [("limit", "1.5")], [("order", "sideways")]] {
            let err = list_params(query(&pairs)).unwrap_err();
            assert_eq!(err.status_code(), 400, "{:?}", pairs);
        }
    }

    #[test]
    fn empty_values_mean_absent() {
        let params = list_params(query(&[("page", ""), ("order", ""), ("sort", "")])).unwrap();
        assert_eq!(params, FindManyParams::default());
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(expect_object(json!({"a": 1})).is_ok());
        let err = expect_object(json!([1])).unwrap_err();
        assert!(err.message().contains("an array"));
    }
}
