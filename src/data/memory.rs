// In-memory model storage
//
// Backs the zero-database mode and the test suites. All models share one
// store behind a single lock so relation loading sees a consistent view.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::defaults::{client_generated, fill_create_defaults, touch_updated_at};
use super::error::DataError;
use super::relation::resolve_relation;
use super::sql::value_as_text;
use super::{ClientRegistry, FindManyArgs, ModelClient, Projection, UniqueWhere};
use crate::query::{Condition, OrderBy, WhereClause};
use crate::schema::{get_model_by_name, get_scalar_fields, Model, Schema};
use crate::types::{Record, SortOrder};

#[derive(Debug, Default)]
struct StoreState {
    tables: HashMap<String, Vec<Record>>,
    sequences: HashMap<String, i64>,
}

#[derive(Clone)]
pub struct InMemoryStore {
    schema: Arc<Schema>,
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    pub fn client(&self, model: &str) -> Option<MemoryModelClient> {
        let model = get_model_by_name(&self.schema, model)?;
        Some(MemoryModelClient {
            schema: self.schema.clone(),
            model: model.name.clone(),
            state: self.state.clone(),
        })
    }

    pub fn client_registry(&self) -> ClientRegistry {
        let mut clients = ClientRegistry::new();
        for model in &self.schema.models {
            if let Some(client) = self.client(&model.name) {
                clients.insert(model.name.clone(), Arc::new(client));
            }
        }
        clients
    }

    /// Snapshot of every stored row of a model
    pub async fn rows(&self, model: &str) -> Vec<Record> {
        let state = self.state.read().await;
        state.tables.get(model).cloned().unwrap_or_default()
    }
}

pub struct MemoryModelClient {
    schema: Arc<Schema>,
    model: String,
    state: Arc<RwLock<StoreState>>,
}

impl MemoryModelClient {
    fn model(&self) -> Result<&Model, DataError> {
        get_model_by_name(&self.schema, &self.model)
            .ok_or_else(|| DataError::Query(format!("Model {} is not in the schema", self.model)))
    }

    fn check_fields<'a>(&self, model: &Model, names: impl Iterator<Item = &'a str>) -> Result<(), DataError> {
        for name in names {
            match model.field(name) {
                Some(f) if f.is_scalar() => {}
                _ => return Err(DataError::unknown_field(&model.name, name)),
            }
        }
        Ok(())
    }

    fn project(&self, state: &StoreState, model: &Model, row: &Record, projection: &Projection) -> Result<Record, DataError> {
        match projection {
            Projection::Default => Ok(row.clone()),
            Projection::Include(relations) => {
                let mut out = row.clone();
                for name in relations {
                    out.insert(name.clone(), self.load_relation(state, model, row, name)?);
                }
                Ok(out)
            }
            Projection::Select(fields) => {
                let mut out = Record::new();
                for name in fields {
                    let field = model
                        .field(name)
                        .ok_or_else(|| DataError::unknown_field(&model.name, name))?;
                    let value = if field.is_scalar() {
                        row.get(name).cloned().unwrap_or(Value::Null)
                    } else {
                        self.load_relation(state, model, row, name)?
                    };
                    out.insert(name.clone(), value);
                }
                Ok(out)
            }
        }
    }

    fn load_relation(&self, state: &StoreState, model: &Model, row: &Record, name: &str) -> Result<Value, DataError> {
        let field = model
            .field(name)
            .filter(|f| f.field_type.is_relation())
            .ok_or_else(|| DataError::unknown_field(&model.name, name))?;
        let link = resolve_relation(&self.schema, model, field)?;

        let related = state
            .tables
            .get(&link.target)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|candidate| {
                link.pairs.iter().all(|(local, remote)| {
                    match (row.get(local), candidate.get(remote)) {
                        (Some(a), Some(b)) if !a.is_null() => loose_eq(a, b),
                        _ => false,
                    }
                })
            });

        if link.many {
            Ok(Value::Array(related.cloned().map(Value::Object).collect()))
        } else {
            Ok(related.cloned().next().map(Value::Object).unwrap_or(Value::Null))
        }
    }

    fn position(rows: &[Record], target: &UniqueWhere) -> Option<usize> {
        let id = target.id.to_string();
        rows.iter()
            .position(|r| r.get(&target.field).is_some_and(|v| value_as_text(v) == id))
    }

    fn check_unique(&self, model: &Model, rows: &[Record], data: &Record, skip: Option<usize>) -> Result<(), DataError> {
        for field in get_scalar_fields(model).into_iter().filter(|f| f.is_id || f.is_unique) {
            let Some(value) = data.get(&field.name).filter(|v| !v.is_null()) else { continue };
            let clash = rows
                .iter()
                .enumerate()
                .any(|(i, r)| Some(i) != skip && r.get(&field.name).is_some_and(|v| loose_eq(v, value)));
            if clash {
                return Err(DataError::UniqueViolation {
                    model: model.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ModelClient for MemoryModelClient {
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>, DataError> {
        let model = self.model()?;
        self.check_fields(model, args.where_clause.fields())?;
        if let Some(order) = &args.order_by {
            self.check_fields(model, std::iter::once(order.field.as_str()))?;
        }

        let state = self.state.read().await;
        let rows = state.tables.get(&model.name).map(Vec::as_slice).unwrap_or_default();

        let mut matched: Vec<&Record> = rows.iter().filter(|r| matches_where(r, &args.where_clause)).collect();
        if let Some(order) = &args.order_by {
            matched.sort_by(|a, b| compare_rows(a, b, order));
        }

        matched
            .into_iter()
            .skip(args.skip.max(0) as usize)
            .take(args.take.max(0) as usize)
            .map(|row| self.project(&state, model, row, &args.projection))
            .collect()
    }

    async fn count(&self, where_clause: &WhereClause) -> Result<i64, DataError> {
        let model = self.model()?;
        self.check_fields(model, where_clause.fields())?;

        let state = self.state.read().await;
        let rows = state.tables.get(&model.name).map(Vec::as_slice).unwrap_or_default();
        Ok(rows.iter().filter(|r| matches_where(r, where_clause)).count() as i64)
    }

    async fn find_unique(&self, target: &UniqueWhere, projection: &Projection) -> Result<Option<Record>, DataError> {
        let model = self.model()?;
        let state = self.state.read().await;
        let rows = state.tables.get(&model.name).map(Vec::as_slice).unwrap_or_default();

        match Self::position(rows, target) {
            Some(i) => self.project(&state, model, &rows[i], projection).map(Some),
            None => Ok(None),
        }
    }

    async fn create(&self, mut data: Record) -> Result<Record, DataError> {
        let model = self.model()?;
        self.check_fields(model, data.keys().map(String::as_str))?;
        fill_create_defaults(model, &mut data, true);

        let mut state = self.state.write().await;
        let StoreState { tables, sequences } = &mut *state;
        let rows = tables.entry(model.name.clone()).or_default();

        let mut record = Record::new();
        for field in get_scalar_fields(model) {
            let value = match data.remove(&field.name) {
                Some(v) => v,
                None => match (field.default_generator(), &field.default) {
                    (Some("autoincrement"), _) => {
                        let highest = rows
                            .iter()
                            .filter_map(|r| r.get(&field.name).and_then(Value::as_i64))
                            .max()
                            .unwrap_or(0);
                        let next = sequences.entry(model.name.clone()).or_insert(0);
                        *next = (*next).max(highest) + 1;
                        Value::from(*next)
                    }
                    (Some(generator), _) => client_generated(generator).unwrap_or(Value::Null),
                    (None, Some(literal)) => literal.clone(),
                    (None, None) => Value::Null,
                },
            };
            record.insert(field.name.clone(), value);
        }

        self.check_unique(model, rows, &record, None)?;
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, target: &UniqueWhere, mut data: Record) -> Result<Record, DataError> {
        let model = self.model()?;
        self.check_fields(model, data.keys().map(String::as_str))?;

        let mut state = self.state.write().await;
        let rows = state.tables.entry(model.name.clone()).or_default();
        let index = Self::position(rows, target).ok_or(DataError::RecordNotFound)?;

        if data.is_empty() {
            return Ok(rows[index].clone());
        }
        touch_updated_at(model, &mut data);
        self.check_unique(model, rows, &data, Some(index))?;

        let row = &mut rows[index];
        for (key, value) in data {
            row.insert(key, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, target: &UniqueWhere) -> Result<Record, DataError> {
        let model = self.model()?;
        let mut state = self.state.write().await;
        let rows = state.tables.entry(model.name.clone()).or_default();
        let index = Self::position(rows, target).ok_or(DataError::RecordNotFound)?;
        Ok(rows.remove(index))
    }
}

/// Equality through the text form, so `"5"` matches `5` and `"true"` matches `true`
fn loose_eq(a: &Value, b: &Value) -> bool {
    a == b || value_as_text(a) == value_as_text(b)
}

fn matches_condition(row: &Record, condition: &Condition) -> bool {
    match condition {
        Condition::Contains { field, needle } => match row.get(field) {
            Some(Value::String(s)) => s.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        Condition::Equals { field, value: Value::Null } => row.get(field).map_or(true, Value::is_null),
        Condition::Equals { field, value } => match row.get(field) {
            Some(v) if !v.is_null() => loose_eq(v, value),
            _ => false,
        },
    }
}

fn matches_where(row: &Record, clause: &WhereClause) -> bool {
    let any = clause.any_of.is_empty() || clause.any_of.iter().any(|c| matches_condition(row, c));
    any && clause.all_of.iter().all(|c| matches_condition(row, c))
}

/// Nulls always sort last, matching `NULLS LAST` on the SQL side
fn compare_rows(a: &Record, b: &Record, order: &OrderBy) -> Ordering {
    let left = a.get(&order.field).filter(|v| !v.is_null());
    let right = b.get(&order.field).filter(|v| !v.is_null());

    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            match order.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => value_as_text(a).cmp(&value_as_text(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::build_where_clause;
    use crate::testing::blog_schema;
    use crate::types::RecordId;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new(Arc::new(blog_schema()));
        let users = store.client("User").unwrap();
        let posts = store.client("Post").unwrap();

        users.create(record(json!({ "email": "ann@example.com", "name": "Ann" }))).await.unwrap();
        users.create(record(json!({ "email": "bob@example.com", "name": "Bob" }))).await.unwrap();
        for (slug, author, views) in [("intro", 1, 10), ("deep-dive", 1, 30), ("news", 2, 20)] {
            posts
                .create(record(json!({ "slug": slug, "title": slug.to_uppercase(), "authorId": author, "views": views })))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let store = seeded().await;
        let rows = store.rows("Post").await;
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first["id"], json!(1));
        assert_eq!(first["published"], json!(false));
        assert_eq!(first["content"], Value::Null);
        assert!(first["createdAt"].as_str().unwrap().ends_with('Z'));
        assert!(first["updatedAt"].is_string());
        assert_eq!(rows[2]["id"], json!(3));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = seeded().await;
        let posts = store.client("Post").unwrap();
        posts.delete(&UniqueWhere::new("id", RecordId::Int(3))).await.unwrap();

        let created = posts
            .create(record(json!({ "slug": "again", "title": "Again", "authorId": 1 })))
            .await
            .unwrap();
        assert_eq!(created["id"], json!(4));
    }

    #[tokio::test]
    async fn unique_fields_reject_duplicates() {
        let store = seeded().await;
        let users = store.client("User").unwrap();
        let err = users.create(record(json!({ "email": "ann@example.com" }))).await.unwrap_err();
        assert!(matches!(err, DataError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn search_and_loose_filters() {
        let store = seeded().await;
        let schema = blog_schema();
        let post = get_model_by_name(&schema, "Post").unwrap();
        let posts = store.client("Post").unwrap();

        let mut filters = serde_json::Map::new();
        filters.insert("authorId".into(), json!("1"));
        let clause = build_where_clause(post, Some("DIVE"), Some(&filters));

        let found = posts
            .find_many(FindManyArgs { where_clause: clause.clone(), take: 20, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["slug"], "deep-dive");
        assert_eq!(posts.count(&clause).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sorting_and_paging() {
        let store = seeded().await;
        let posts = store.client("Post").unwrap();

        let page = posts
            .find_many(FindManyArgs {
                order_by: Some(OrderBy { field: "views".into(), order: SortOrder::Desc }),
                skip: 1,
                take: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["slug"], "news");
    }

    #[tokio::test]
    async fn nulls_sort_last_in_both_directions() {
        let store = seeded().await;
        let users = store.client("User").unwrap();
        users.create(record(json!({ "email": "nameless@example.com" }))).await.unwrap();

        for order in [SortOrder::Asc, SortOrder::Desc] {
            let rows = users
                .find_many(FindManyArgs {
                    order_by: Some(OrderBy { field: "name".into(), order }),
                    take: 10,
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(rows[2]["name"], Value::Null);
        }
    }

    #[tokio::test]
    async fn relations_load_through_links() {
        let store = seeded().await;
        let users = store.client("User").unwrap();
        let posts = store.client("Post").unwrap();

        let ann = users
            .find_unique(&UniqueWhere::new("id", RecordId::Int(1)), &Projection::Include(vec!["posts".into()]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ann["posts"].as_array().unwrap().len(), 2);

        let news = posts
            .find_unique(
                &UniqueWhere::new("id", RecordId::Int(3)),
                &Projection::Select(vec!["title".into(), "author".into()]),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news["author"]["name"], "Bob");
    }

    #[tokio::test]
    async fn update_and_delete_missing_records() {
        let store = seeded().await;
        let posts = store.client("Post").unwrap();
        let missing = UniqueWhere::new("id", RecordId::Int(99));

        assert!(matches!(
            posts.update(&missing, record(json!({ "title": "x" }))).await,
            Err(DataError::RecordNotFound)
        ));
        assert!(matches!(posts.delete(&missing).await, Err(DataError::RecordNotFound)));
    }

    #[tokio::test]
    async fn update_merges_and_stamps() {
        let store = seeded().await;
        let posts = store.client("Post").unwrap();
        let target = UniqueWhere::new("id", RecordId::Int(1));
        let before = store.rows("Post").await[0].clone();

        let updated = posts.update(&target, record(json!({ "title": "Renamed" }))).await.unwrap();
        assert_eq!(updated["title"], "Renamed");
        assert_eq!(updated["slug"], before["slug"]);

        let unchanged = posts.update(&target, Record::new()).await.unwrap();
        assert_eq!(unchanged, updated);
    }

    #[tokio::test]
    async fn unknown_fields_are_rejected() {
        let store = seeded().await;
        let posts = store.client("Post").unwrap();

        let mut filters = serde_json::Map::new();
        filters.insert("nope".into(), json!("1"));
        let schema = blog_schema();
        let post = get_model_by_name(&schema, "Post").unwrap();
        let err = posts
            .find_many(FindManyArgs {
                where_clause: build_where_clause(post, None, Some(&filters)),
                take: 20,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownField { .. }));
    }
}
