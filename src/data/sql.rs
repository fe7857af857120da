// SQL generation for the Postgres model client
//
// Every statement returns records as a single jsonb column so rows never need
// per-type decoding. Values are always bound as parameters; identifiers are
// checked against the model and double-quoted.

use serde_json::Value;

use super::error::DataError;
use super::relation::resolve_relation;
use super::{FindManyArgs, Projection, UniqueWhere};
use crate::query::{Condition, OrderBy, WhereClause};
use crate::schema::{get_model_by_name, Model, Schema};
use crate::types::Record;

/// jsonb_build_object accepts at most 100 arguments
const MAX_PAIRS_PER_OBJECT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub query: String,
    pub params: Vec<SqlParam>,
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape LIKE wildcards so user input matches literally
pub fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Text form used for loose equality by the in-memory store
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct SqlBuilder<'a> {
    schema: &'a Schema,
    model: &'a Model,
    namespace: &'a str,
    params: Vec<SqlParam>,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(schema: &'a Schema, model: &'a Model, namespace: &'a str) -> Self {
        Self {
            schema,
            model,
            namespace,
            params: Vec::new(),
        }
    }

    pub fn select(mut self, args: &FindManyArgs) -> Result<SqlStatement, DataError> {
        let record = self.record_expr(self.model, "t", &args.projection)?;
        let mut query = format!("SELECT {} AS record FROM {} AS t", record, self.table(self.model));

        let filter = self.where_sql(&args.where_clause)?;
        if !filter.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&filter);
        }
        if let Some(order) = &args.order_by {
            query.push_str(&self.order_sql(order)?);
        }

        let take = self.push(SqlParam::Int(args.take));
        let skip = self.push(SqlParam::Int(args.skip));
        query.push_str(&format!(" LIMIT {} OFFSET {}", take, skip));

        Ok(self.finish(query))
    }

    pub fn count(mut self, where_clause: &WhereClause) -> Result<SqlStatement, DataError> {
        let mut query = format!("SELECT COUNT(*) AS count FROM {} AS t", self.table(self.model));
        let filter = self.where_sql(where_clause)?;
        if !filter.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&filter);
        }
        Ok(self.finish(query))
    }

    pub fn find_unique(mut self, target: &UniqueWhere, projection: &Projection) -> Result<SqlStatement, DataError> {
        let record = self.record_expr(self.model, "t", projection)?;
        let key = self.unique_sql(target)?;
        let query = format!(
            "SELECT {} AS record FROM {} AS t WHERE {} LIMIT 1",
            record,
            self.table(self.model),
            key
        );
        Ok(self.finish(query))
    }

    pub fn insert(mut self, data: &Record) -> Result<SqlStatement, DataError> {
        let table = self.table(self.model);
        if data.is_empty() {
            let query = format!("INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t.*) AS record", table);
            return Ok(self.finish(query));
        }

        let columns = self.data_columns(data)?;
        let source = self.push(SqlParam::Json(Value::Object(data.clone())));
        let query = format!(
            "INSERT INTO {table} AS t ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::{table}, {source}) \
             RETURNING to_jsonb(t.*) AS record",
            table = table,
            cols = columns.join(", "),
            source = source,
        );
        Ok(self.finish(query))
    }

    /// Callers handle the empty payload; an UPDATE needs at least one column
    pub fn update(mut self, target: &UniqueWhere, data: &Record) -> Result<SqlStatement, DataError> {
        if data.is_empty() {
            return Err(DataError::Query("update requires at least one field".to_string()));
        }
        let table = self.table(self.model);
        let columns = self.data_columns(data)?;
        let source = self.push(SqlParam::Json(Value::Object(data.clone())));
        let key = self.unique_sql(target)?;

        let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = src.{c}")).collect();
        let query = format!(
            "UPDATE {table} AS t SET {set} FROM jsonb_populate_record(NULL::{table}, {source}) AS src \
             WHERE {key} RETURNING to_jsonb(t.*) AS record",
            table = table,
            set = assignments.join(", "),
            source = source,
            key = key,
        );
        Ok(self.finish(query))
    }

    pub fn delete(mut self, target: &UniqueWhere) -> Result<SqlStatement, DataError> {
        let key = self.unique_sql(target)?;
        let query = format!(
            "DELETE FROM {} AS t WHERE {} RETURNING to_jsonb(t.*) AS record",
            self.table(self.model),
            key
        );
        Ok(self.finish(query))
    }

    fn finish(self, query: String) -> SqlStatement {
        SqlStatement {
            query,
            params: self.params,
        }
    }

    fn push(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn table(&self, model: &Model) -> String {
        format!("{}.{}", quote_ident(self.namespace), quote_ident(model.storage_name()))
    }

    fn scalar_column(&self, model: &Model, name: &str) -> Result<String, DataError> {
        match model.field(name) {
            Some(f) if f.is_scalar() => Ok(quote_ident(&f.name)),
            _ => Err(DataError::unknown_field(&model.name, name)),
        }
    }

    fn data_columns(&self, data: &Record) -> Result<Vec<String>, DataError> {
        data.keys().map(|k| self.scalar_column(self.model, k)).collect()
    }

    fn unique_sql(&mut self, target: &UniqueWhere) -> Result<String, DataError> {
        let column = self.scalar_column(self.model, &target.field)?;
        let value = self.typed_value(&target.field, target.id.to_value());
        Ok(format!("t.{} = {}", column, value))
    }

    /// `value` read back through the table's row type, so comparisons run
    /// against the column's own type and can use its indexes
    fn typed_value(&mut self, field: &str, value: Value) -> String {
        let mut row = serde_json::Map::new();
        row.insert(field.to_string(), value);
        let param = self.push(SqlParam::Json(Value::Object(row)));
        format!(
            "(jsonb_populate_record(NULL::{}, {})).{}",
            self.table(self.model),
            param,
            quote_ident(field)
        )
    }

    fn where_sql(&mut self, clause: &WhereClause) -> Result<String, DataError> {
        let mut terms = Vec::new();

        if !clause.any_of.is_empty() {
            let group = clause
                .any_of
                .iter()
                .map(|c| self.condition_sql(c))
                .collect::<Result<Vec<_>, _>>()?;
            terms.push(format!("({})", group.join(" OR ")));
        }
        for condition in &clause.all_of {
            terms.push(self.condition_sql(condition)?);
        }

        Ok(terms.join(" AND "))
    }

    fn condition_sql(&mut self, condition: &Condition) -> Result<String, DataError> {
        let column = self.scalar_column(self.model, condition.field())?;
        match condition {
            Condition::Contains { needle, .. } => {
                // uuid, enum and array columns have no ILIKE of their own
                let param = self.push(SqlParam::Text(format!("%{}%", escape_like(needle))));
                Ok(format!("t.{}::text ILIKE {}", column, param))
            }
            Condition::Equals { value: Value::Null, .. } => Ok(format!("t.{} IS NULL", column)),
            Condition::Equals { field, value } => {
                let value = self.typed_value(field, value.clone());
                Ok(format!("t.{} = {}", column, value))
            }
        }
    }

    fn order_sql(&self, order: &OrderBy) -> Result<String, DataError> {
        let column = self.scalar_column(self.model, &order.field)?;
        Ok(format!(" ORDER BY t.{} {} NULLS LAST", column, order.order.as_sql()))
    }

    /// jsonb expression for one record of `model` aliased as `alias`
    fn record_expr(&self, model: &Model, alias: &str, projection: &Projection) -> Result<String, DataError> {
        match projection {
            Projection::Default => Ok(format!("to_jsonb({}.*)", alias)),
            Projection::Include(relations) => {
                let mut pairs = Vec::new();
                for name in relations {
                    pairs.push((name.clone(), self.relation_expr(model, alias, name)?));
                }
                if pairs.is_empty() {
                    return Ok(format!("to_jsonb({}.*)", alias));
                }
                Ok(format!("to_jsonb({}.*) || {}", alias, build_object(&pairs)))
            }
            Projection::Select(fields) => {
                let mut pairs = Vec::new();
                for name in fields {
                    let field = model
                        .field(name)
                        .ok_or_else(|| DataError::unknown_field(&model.name, name))?;
                    let expr = if field.is_scalar() {
                        format!("{}.{}", alias, quote_ident(&field.name))
                    } else {
                        self.relation_expr(model, alias, name)?
                    };
                    pairs.push((name.clone(), expr));
                }
                if pairs.is_empty() {
                    return Ok("'{}'::jsonb".to_string());
                }
                Ok(build_object(&pairs))
            }
        }
    }

    /// Correlated subquery loading one relation field
    fn relation_expr(&self, model: &Model, alias: &str, name: &str) -> Result<String, DataError> {
        let field = model
            .field(name)
            .filter(|f| f.field_type.is_relation())
            .ok_or_else(|| DataError::unknown_field(&model.name, name))?;
        let link = resolve_relation(self.schema, model, field)?;
        let target = get_model_by_name(self.schema, &link.target)
            .ok_or_else(|| DataError::Query(format!("Unknown related model {}", link.target)))?;

        let inner = if alias == "t" { "r" } else { "rr" };
        let join: Vec<String> = link
            .pairs
            .iter()
            .map(|(local, remote)| {
                format!(
                    "{inner}.{} = {alias}.{}",
                    quote_ident(remote),
                    quote_ident(local),
                    inner = inner,
                    alias = alias
                )
            })
            .collect();

        let source = format!("{} AS {} WHERE {}", self.table(target), inner, join.join(" AND "));
        if link.many {
            Ok(format!(
                "(SELECT COALESCE(jsonb_agg(to_jsonb({inner}.*)), '[]'::jsonb) FROM {source})",
                inner = inner,
                source = source
            ))
        } else {
            Ok(format!("(SELECT to_jsonb({}.*) FROM {} LIMIT 1)", inner, source))
        }
    }
}

/// `jsonb_build_object` over the pairs, chunked and concatenated with `||`
fn build_object(pairs: &[(String, String)]) -> String {
    pairs
        .chunks(MAX_PAIRS_PER_OBJECT)
        .map(|chunk| {
            let args: Vec<String> = chunk
                .iter()
                .map(|(key, expr)| format!("'{}', {}", key.replace('\'', "''"), expr))
                .collect();
            format!("jsonb_build_object({})", args.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" || ")
}
