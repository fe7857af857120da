use serde_json::{json, Map, Value};

use crate::schema::{get_searchable_fields, Model};

/// The single "no value" predicate: null and the empty string are absent.
/// `None` at the call site covers the missing-key case.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive substring match
    Contains { field: String, needle: String },
    /// Exact match
    Equals { field: String, value: Value },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Contains { field, .. } | Condition::Equals { field, .. } => field,
        }
    }

    fn to_value(&self) -> (String, Value) {
        match self {
            Condition::Contains { field, needle } => (
                field.clone(),
                json!({ "contains": needle, "mode": "insensitive" }),
            ),
            Condition::Equals { field, value } => (field.clone(), value.clone()),
        }
    }
}

/// Top-level AND of an optional OR group (search) and equality terms (filters)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub any_of: Vec<Condition>,
    pub all_of: Vec<Condition>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty() && self.all_of.is_empty()
    }

    /// Every field name the clause refers to
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.any_of.iter().chain(self.all_of.iter()).map(Condition::field)
    }

    /// Render in the Prisma `where` shape
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        if !self.any_of.is_empty() {
            let group: Vec<Value> = self
                .any_of
                .iter()
                .map(|c| {
                    let (k, v) = c.to_value();
                    let mut m = Map::new();
                    m.insert(k, v);
                    Value::Object(m)
                })
                .collect();
            out.insert("OR".to_string(), Value::Array(group));
        }
        for c in &self.all_of {
            let (k, v) = c.to_value();
            out.insert(k, v);
        }
        Value::Object(out)
    }
}

pub fn build_where_clause(model: &Model, search: Option<&str>, filters: Option<&Map<String, Value>>) -> WhereClause {
    let mut clause = WhereClause::default();

    if let Some(needle) = search.filter(|s| !s.is_empty()) {
        clause.any_of = get_searchable_fields(model)
            .into_iter()
            .map(|f| Condition::Contains {
                field: f.name.clone(),
                needle: needle.to_string(),
            })
            .collect();
    }

    if let Some(filters) = filters {
        for (key, value) in filters {
            if is_absent(value) {
                continue;
            }
            clause.all_of.push(Condition::Equals {
                field: key.clone(),
                value: value.clone(),
            });
        }
    }

    clause
}
