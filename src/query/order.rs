use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::models::DefaultSort;
use crate::types::SortOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(self.field.clone(), json!(self.order));
        Value::Object(out)
    }
}

/// Explicit sort wins, then the configured default, else the client's own ordering
pub fn build_order_by_clause(
    sort: Option<&str>,
    order: Option<SortOrder>,
    default_sort: Option<&DefaultSort>,
) -> Option<OrderBy> {
    if let Some(field) = sort.filter(|s| !s.is_empty()) {
        return Some(OrderBy {
            field: field.to_string(),
            order: order.unwrap_or_default(),
        });
    }

    default_sort.map(|d| OrderBy {
        field: d.field.clone(),
        order: d.order,
    })
}
