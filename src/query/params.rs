use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::SortOrder;

/// Request parameters for a list query. Before-find hooks receive and may
/// replace the whole value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindManyParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub search: Option<String>,
    pub include: Option<String>,
    /// Exact-match filters; keys are passed through unvalidated
    pub filters: Option<Map<String, Value>>,
}

impl FindManyParams {
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}
