// Postgres introspection
//
// Reads tables, columns, keys, enums and foreign keys from the catalog and
// produces the same raw datamodel the file parser accepts.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use sqlx::{PgPool, Row};

use super::parser::{RawDatamodel, RawEnum, RawEnumValue, RawField, RawModel, RawPrimaryKey};
use super::{parse_datamodel, Schema, SchemaError};

/// Tables that are bookkeeping rather than data
const SKIPPED_TABLES: [&str; 1] = ["_prisma_migrations"];

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub table: String,
    pub name: String,
    pub data_type: String,
    pub udt_name: String,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeyInfo {
    pub table: String,
    pub constraint: String,
    pub primary: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    pub on_delete: String,
}

/// Introspect a database schema (namespace) into a `Schema`
pub async fn introspect(pool: &PgPool, namespace: &str) -> Result<Schema, SchemaError> {
    let enums = load_enums(pool, namespace).await?;
    let columns = load_columns(pool, namespace).await?;
    let keys = load_keys(pool, namespace).await?;
    let foreign_keys = load_foreign_keys(pool, namespace).await?;

    tracing::info!(
        "Introspected schema '{}': {} columns, {} keys, {} foreign keys",
        namespace,
        columns.len(),
        keys.len(),
        foreign_keys.len()
    );

    let raw = assemble(enums, columns, keys, foreign_keys);
    parse_datamodel(raw)
}

async fn load_enums(pool: &PgPool, namespace: &str) -> Result<Vec<RawEnum>, SchemaError> {
    let rows = sqlx::query(
        "SELECT t.typname::text AS name, e.enumlabel::text AS value \
         FROM pg_type t \
         JOIN pg_enum e ON e.enumtypid = t.oid \
         JOIN pg_namespace n ON n.oid = t.typnamespace \
         WHERE n.nspname = $1 \
         ORDER BY t.typname, e.enumsortorder",
    )
    .bind(namespace)
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<String, Vec<RawEnumValue>> = BTreeMap::new();
    for row in rows {
        let name: String = row.try_get("name")?;
        let value: String = row.try_get("value")?;
        grouped.entry(name).or_default().push(RawEnumValue { name: value });
    }

    Ok(grouped
        .into_iter()
        .map(|(name, values)| RawEnum { name, values, documentation: None })
        .collect())
}

async fn load_columns(pool: &PgPool, namespace: &str) -> Result<Vec<ColumnInfo>, SchemaError> {
    let rows = sqlx::query(
        "SELECT c.table_name::text AS table_name, c.column_name::text AS column_name, \
                c.data_type::text AS data_type, c.udt_name::text AS udt_name, \
                c.is_nullable::text AS is_nullable, c.column_default::text AS column_default \
         FROM information_schema.columns c \
         JOIN information_schema.tables t \
           ON t.table_schema = c.table_schema AND t.table_name = c.table_name \
         WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE' \
         ORDER BY c.table_name, c.ordinal_position",
    )
    .bind(namespace)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let nullable: String = row.try_get("is_nullable")?;
            Ok(ColumnInfo {
                table: row.try_get("table_name")?,
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                udt_name: row.try_get("udt_name")?,
                nullable: nullable == "YES",
                default: row.try_get("column_default")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(SchemaError::from)
}

async fn load_keys(pool: &PgPool, namespace: &str) -> Result<Vec<KeyInfo>, SchemaError> {
    let rows = sqlx::query(
        "SELECT tc.table_name::text AS table_name, tc.constraint_name::text AS constraint_name, \
                tc.constraint_type::text AS constraint_type, kcu.column_name::text AS column_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON kcu.constraint_name = tc.constraint_name \
          AND kcu.table_schema = tc.table_schema \
          AND kcu.table_name = tc.table_name \
         WHERE tc.table_schema = $1 AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE') \
         ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position",
    )
    .bind(namespace)
    .fetch_all(pool)
    .await?;

    let mut keys: Vec<KeyInfo> = Vec::new();
    for row in rows {
        let table: String = row.try_get("table_name")?;
        let constraint: String = row.try_get("constraint_name")?;
        let kind: String = row.try_get("constraint_type")?;
        let column: String = row.try_get("column_name")?;

        match keys.last_mut() {
            Some(last) if last.table == table && last.constraint == constraint => last.columns.push(column),
            _ => keys.push(KeyInfo {
                table,
                constraint,
                primary: kind == "PRIMARY KEY",
                columns: vec![column],
            }),
        }
    }
    Ok(keys)
}

async fn load_foreign_keys(pool: &PgPool, namespace: &str) -> Result<Vec<ForeignKeyInfo>, SchemaError> {
    let rows = sqlx::query(
        "SELECT con.conname::text AS name, src.relname::text AS table_name, tgt.relname::text AS target_table, \
                array_agg(sa.attname::text ORDER BY k.ord) AS columns, \
                array_agg(ta.attname::text ORDER BY k.ord) AS target_columns, \
                con.confdeltype::text AS on_delete \
         FROM pg_constraint con \
         JOIN pg_class src ON src.oid = con.conrelid \
         JOIN pg_class tgt ON tgt.oid = con.confrelid \
         JOIN pg_namespace n ON n.oid = src.relnamespace \
         CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_att, tgt_att, ord) \
         JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_att \
         JOIN pg_attribute ta ON ta.attrelid = con.confrelid AND ta.attnum = k.tgt_att \
         WHERE con.contype = 'f' AND n.nspname = $1 \
         GROUP BY con.conname, src.relname, tgt.relname, con.confdeltype \
         ORDER BY src.relname, con.conname",
    )
    .bind(namespace)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let code: String = row.try_get("on_delete")?;
            Ok(ForeignKeyInfo {
                name: row.try_get("name")?,
                table: row.try_get("table_name")?,
                columns: row.try_get("columns")?,
                target_table: row.try_get("target_table")?,
                target_columns: row.try_get("target_columns")?,
                on_delete: on_delete_action(&code).to_string(),
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(SchemaError::from)
}

fn on_delete_action(code: &str) -> &'static str {
    match code {
        "r" => "Restrict",
        "c" => "Cascade",
        "n" => "SetNull",
        "d" => "SetDefault",
        _ => "NoAction",
    }
}

/// Build the raw datamodel from catalog rows. Pure, so it can be tested
/// without a database.
pub fn assemble(
    enums: Vec<RawEnum>,
    columns: Vec<ColumnInfo>,
    keys: Vec<KeyInfo>,
    foreign_keys: Vec<ForeignKeyInfo>,
) -> RawDatamodel {
    let enum_names: Vec<String> = enums.iter().map(|e| e.name.clone()).collect();

    // BTreeMap keeps model order stable across runs
    let mut models: BTreeMap<String, RawModel> = BTreeMap::new();
    for column in columns {
        if SKIPPED_TABLES.contains(&column.table.as_str()) {
            continue;
        }
        let field = column_to_field(&column, &enum_names);
        models
            .entry(column.table.clone())
            .or_insert_with(|| RawModel {
                name: column.table.clone(),
                db_name: None,
                documentation: None,
                fields: Vec::new(),
                primary_key: None,
                unique_fields: Vec::new(),
            })
            .fields
            .push(field);
    }

    for key in keys {
        let Some(model) = models.get_mut(&key.table) else { continue };
        match (key.primary, key.columns.as_slice()) {
            (true, [single]) => set_flag(model, single, |f| f.is_id = true),
            (true, _) => model.primary_key = Some(RawPrimaryKey { fields: key.columns.clone() }),
            (false, [single]) => set_flag(model, single, |f| f.is_unique = true),
            (false, _) => model.unique_fields.push(key.columns.clone()),
        }
    }

    for fk in foreign_keys {
        if !models.contains_key(&fk.table) || !models.contains_key(&fk.target_table) {
            continue;
        }

        let required = models
            .get(&fk.table)
            .map(|m| {
                fk.columns.iter().all(|c| {
                    m.fields.iter().any(|f| &f.name == c && f.is_required)
                })
            })
            .unwrap_or(false);

        if let Some(owner) = models.get_mut(&fk.table) {
            let name = unique_field_name(owner, &lower_first(&fk.target_table), &fk.name);
            owner.fields.push(RawField {
                name,
                type_name: fk.target_table.clone(),
                is_required: required,
                is_list: false,
                is_unique: false,
                is_id: false,
                is_updated_at: false,
                has_default_value: false,
                default: None,
                documentation: None,
                relation_name: Some(fk.name.clone()),
                relation_from_fields: Some(fk.columns.clone()),
                relation_to_fields: Some(fk.target_columns.clone()),
                relation_on_delete: Some(fk.on_delete.clone()),
            });
        }

        if let Some(target) = models.get_mut(&fk.target_table) {
            let name = unique_field_name(target, &lower_first(&fk.table), &fk.name);
            target.fields.push(RawField {
                name,
                type_name: fk.table.clone(),
                is_required: false,
                is_list: true,
                is_unique: false,
                is_id: false,
                is_updated_at: false,
                has_default_value: false,
                default: None,
                documentation: None,
                relation_name: Some(fk.name.clone()),
                relation_from_fields: None,
                relation_to_fields: None,
                relation_on_delete: None,
            });
        }
    }

    RawDatamodel {
        enums,
        models: models.into_values().collect(),
    }
}

fn set_flag(model: &mut RawModel, column: &str, apply: impl FnOnce(&mut RawField)) {
    if let Some(field) = model.fields.iter_mut().find(|f| f.name == column) {
        apply(field);
    }
}

fn unique_field_name(model: &RawModel, preferred: &str, constraint: &str) -> String {
    if model.fields.iter().all(|f| f.name != preferred) {
        return preferred.to_string();
    }
    format!("{}_{}", preferred, constraint)
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn column_to_field(column: &ColumnInfo, enum_names: &[String]) -> RawField {
    let is_list = column.data_type == "ARRAY";
    let udt = if is_list {
        column.udt_name.trim_start_matches('_')
    } else {
        column.udt_name.as_str()
    };

    let type_name = if enum_names.iter().any(|e| e == udt) {
        udt.to_string()
    } else {
        scalar_type_name(udt).to_string()
    };

    let default = column.default.as_deref().map(parse_column_default);

    RawField {
        name: column.name.clone(),
        type_name,
        is_required: !column.nullable,
        is_list,
        is_unique: false,
        is_id: false,
        is_updated_at: false,
        has_default_value: default.is_some(),
        default,
        documentation: None,
        relation_name: None,
        relation_from_fields: None,
        relation_to_fields: None,
        relation_on_delete: None,
    }
}

fn scalar_type_name(udt: &str) -> &'static str {
    match udt {
        "int2" | "int4" => "Int",
        "int8" => "BigInt",
        "float4" | "float8" => "Float",
        "numeric" | "money" => "Decimal",
        "bool" => "Boolean",
        "timestamp" | "timestamptz" | "date" | "time" | "timetz" => "DateTime",
        "json" | "jsonb" => "Json",
        "bytea" => "Bytes",
        _ => "String",
    }
}

/// Translate a column default expression into datamodel form
pub fn parse_column_default(expr: &str) -> Value {
    let trimmed = expr.trim();
    let lower = trimmed.to_ascii_lowercase();

    let generator = |name: &str| json!({ "name": name, "args": [] });

    if lower.starts_with("nextval(") {
        return generator("autoincrement");
    }
    if lower == "now()" || lower.starts_with("current_timestamp") || lower == "transaction_timestamp()" {
        return generator("now");
    }
    if lower.starts_with("gen_random_uuid(") || lower.starts_with("uuid_generate_v4(") {
        return generator("uuid");
    }
    if lower == "true" || lower == "false" {
        return Value::Bool(lower == "true");
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return json!(f);
    }

    // 'literal'::type
    if let Some(rest) = trimmed.strip_prefix('\'') {
        if let Some(end) = rest.find("'::").or_else(|| rest.strip_suffix('\'').map(|s| s.len())) {
            return Value::String(rest[..end].replace("''", "'"));
        }
    }

    json!({ "name": "dbgenerated", "args": [trimmed] })
}
