pub mod error;
pub mod introspect;
pub mod parser;

pub use error::SchemaError;
pub use parser::{load_schema_file, parse_datamodel};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic type of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    #[serde(rename = "bigint")]
    BigInt,
    Decimal,
    Json,
    Bytes,
    Enum,
    Relation,
}

impl FieldType {
    /// Map a raw datamodel type name to a scalar type, if it is one
    pub fn from_scalar_name(raw: &str) -> Option<Self> {
        match raw {
            "String" => Some(FieldType::String),
            "Int" | "Float" => Some(FieldType::Number),
            "Boolean" => Some(FieldType::Boolean),
            "DateTime" => Some(FieldType::Date),
            "BigInt" => Some(FieldType::BigInt),
            "Decimal" => Some(FieldType::Decimal),
            "Json" => Some(FieldType::Json),
            "Bytes" => Some(FieldType::Bytes),
            _ => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldType::Relation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub is_required: bool,
    pub is_list: bool,
    pub is_unique: bool,
    pub is_id: bool,
    pub is_updated_at: bool,
    pub has_default_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
    /// Raw target type name; for relations this is the related model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_from_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_to_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl Field {
    /// Name of the default generator (`autoincrement`, `uuid`, `now`, ...) if the
    /// default is a function rather than a literal
    pub fn default_generator(&self) -> Option<&str> {
        self.default
            .as_ref()
            .and_then(|d| d.get("name"))
            .and_then(|n| n.as_str())
    }

    pub fn is_scalar(&self) -> bool {
        !self.field_type.is_relation()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_fields: Vec<Vec<String>>,
}

impl Model {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Table name used by storage
    pub fn storage_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enum {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Immutable snapshot of the data model, built once at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub models: Vec<Model>,
    pub enums: Vec<Enum>,
}

impl Schema {
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Case-insensitive model lookup; the first match wins
pub fn get_model_by_name<'a>(schema: &'a Schema, name: &str) -> Option<&'a Model> {
    schema
        .models
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

pub fn get_scalar_fields(model: &Model) -> Vec<&Field> {
    model.fields.iter().filter(|f| f.is_scalar()).collect()
}

pub fn get_relation_fields(model: &Model) -> Vec<&Field> {
    model.fields.iter().filter(|f| f.field_type.is_relation()).collect()
}

pub fn get_id_field(model: &Model) -> Option<&Field> {
    model.fields.iter().find(|f| f.is_id)
}

/// String fields that do not take part in a relation link
pub fn get_searchable_fields(model: &Model) -> Vec<&Field> {
    let link_columns: Vec<&str> = model
        .fields
        .iter()
        .filter_map(|f| f.relation_from_fields.as_ref())
        .flatten()
        .map(String::as_str)
        .collect();

    model
        .fields
        .iter()
        .filter(|f| {
            f.field_type == FieldType::String
                && f.relation_name.is_none()
                && !link_columns.contains(&f.name.as_str())
        })
        .collect()
}

/// Scalar fields a caller must supply on create
pub fn get_required_fields(model: &Model) -> Vec<&Field> {
    get_scalar_fields(model)
        .into_iter()
        .filter(|f| f.is_required && !f.has_default_value && !f.is_id)
        .collect()
}
