// Datamodel parser
//
// Accepts a raw datamodel document (the JSON/YAML shape produced by a Prisma
// DMMF dump, or by `introspect`) and turns it into a `Schema`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Enum, Field, FieldType, Model, Schema, SchemaError};

/// Locations searched when no schema path is configured
const DEFAULT_SCHEMA_PATHS: [&str; 4] = [
    "prisma/schema.json",
    "schema.json",
    "schema.yaml",
    "schema.yml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDatamodel {
    #[serde(default)]
    pub enums: Vec<RawEnum>,
    #[serde(default)]
    pub models: Vec<RawModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnumValue {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnum {
    pub name: String,
    pub values: Vec<RawEnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub is_updated_at: bool,
    #[serde(default)]
    pub has_default_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_from_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_to_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_on_delete: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPrimaryKey {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub fields: Vec<RawField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<RawPrimaryKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_fields: Vec<Vec<String>>,
}

/// Load the schema from a datamodel file. With no explicit path the usual
/// locations are searched relative to the working directory.
pub fn load_schema_file(path: Option<&Path>) -> Result<Schema, SchemaError> {
    let path = resolve_schema_path(path)?;
    let content = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let raw = parse_raw(&path, &content)?;
    let schema = parse_datamodel(raw)?;
    tracing::info!(
        "Loaded schema from {}: {} models, {} enums",
        path.display(),
        schema.models.len(),
        schema.enums.len()
    );
    Ok(schema)
}

fn resolve_schema_path(path: Option<&Path>) -> Result<PathBuf, SchemaError> {
    if let Some(p) = path {
        if !p.exists() {
            return Err(SchemaError::FileNotFound(p.display().to_string()));
        }
        return Ok(p.to_path_buf());
    }

    DEFAULT_SCHEMA_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| SchemaError::FileNotFound(DEFAULT_SCHEMA_PATHS.join(", ")))
}

fn parse_raw(path: &Path, content: &str) -> Result<RawDatamodel, SchemaError> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

/// Convert a raw datamodel into the schema snapshot.
///
/// Enums are resolved first; a field whose type is neither a known scalar nor
/// an enum name is a relation, and must point at a model in the same document.
pub fn parse_datamodel(raw: RawDatamodel) -> Result<Schema, SchemaError> {
    let enums = raw
        .enums
        .into_iter()
        .map(|e| {
            if e.values.is_empty() {
                return Err(SchemaError::EmptyEnum(e.name));
            }
            Ok(Enum {
                name: e.name,
                values: e.values.into_iter().map(|v| v.name).collect(),
                documentation: e.documentation,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let model_names: HashSet<String> = raw.models.iter().map(|m| m.name.clone()).collect();

    let models = raw
        .models
        .into_iter()
        .map(|m| parse_model(m, &enums, &model_names))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Schema { models, enums })
}

fn parse_model(raw: RawModel, enums: &[Enum], model_names: &HashSet<String>) -> Result<Model, SchemaError> {
    let fields = raw
        .fields
        .into_iter()
        .map(|f| parse_field(&raw.name, f, enums, model_names))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Model {
        name: raw.name,
        db_name: raw.db_name,
        documentation: raw.documentation,
        fields,
        primary_key: raw.primary_key.map(|pk| pk.fields),
        unique_fields: raw.unique_fields,
    })
}

fn parse_field(
    model: &str,
    raw: RawField,
    enums: &[Enum],
    model_names: &HashSet<String>,
) -> Result<Field, SchemaError> {
    let enum_def = enums.iter().find(|e| e.name == raw.type_name);

    let field_type = match (enum_def, FieldType::from_scalar_name(&raw.type_name)) {
        (Some(_), _) => FieldType::Enum,
        (None, Some(scalar)) => scalar,
        (None, None) => FieldType::Relation,
    };

    if field_type.is_relation() && !model_names.contains(&raw.type_name) {
        return Err(SchemaError::InvalidDatamodel(format!(
            "{}.{} has unknown type '{}'",
            model, raw.name, raw.type_name
        )));
    }

    Ok(Field {
        name: raw.name,
        field_type,
        is_required: raw.is_required,
        is_list: raw.is_list,
        is_unique: raw.is_unique,
        is_id: raw.is_id,
        is_updated_at: raw.is_updated_at,
        has_default_value: raw.has_default_value,
        default: raw.default,
        documentation: raw.documentation,
        relation_name: raw.relation_name,
        related_model: field_type.is_relation().then(|| raw.type_name.clone()),
        relation_from_fields: raw.relation_from_fields,
        relation_to_fields: raw.relation_to_fields,
        relation_on_delete: raw.relation_on_delete,
        enum_values: enum_def.map(|e| e.values.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDatamodel {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_scalar_types() {
        let schema = parse_datamodel(raw(json!({
            "models": [{
                "name": "Thing",
                "fields": [
                    { "name": "a", "type": "Int" },
                    { "name": "b", "type": "Float" },
                    { "name": "c", "type": "DateTime" },
                    { "name": "d", "type": "BigInt" },
                    { "name": "e", "type": "Bytes" },
                    { "name": "f", "type": "Json" }
                ]
            }]
        })))
        .unwrap();

        let types: Vec<_> = schema.models[0].fields.iter().map(|f| f.field_type).collect();
        assert_eq!(
            types,
            vec![
                FieldType::Number,
                FieldType::Number,
                FieldType::Date,
                FieldType::BigInt,
                FieldType::Bytes,
                FieldType::Json
            ]
        );
    }

    #[test]
    fn enums_resolve_before_relation_detection() {
        let schema = parse_datamodel(raw(json!({
            "enums": [{ "name": "Role", "values": [{ "name": "USER" }, { "name": "ADMIN" }] }],
            "models": [
                { "name": "User", "fields": [
                    { "name": "role", "type": "Role" },
                    { "name": "team", "type": "Team", "relationName": "TeamToUser" }
                ]},
                { "name": "Team", "fields": [{ "name": "id", "type": "Int", "isId": true }] }
            ]
        })))
        .unwrap();

        let user = &schema.models[0];
        assert_eq!(user.fields[0].field_type, FieldType::Enum);
        assert_eq!(
            user.fields[0].enum_values.as_deref(),
            Some(&["USER".to_string(), "ADMIN".to_string()][..])
        );
        assert_eq!(user.fields[1].field_type, FieldType::Relation);
        assert_eq!(user.fields[1].related_model.as_deref(), Some("Team"));
    }

    #[test]
    fn rejects_unknown_relation_target() {
        let err = parse_datamodel(raw(json!({
            "models": [{ "name": "User", "fields": [{ "name": "x", "type": "Nope" }] }]
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDatamodel(_)));
    }

    #[test]
    fn rejects_empty_enum() {
        let err = parse_datamodel(raw(json!({
            "enums": [{ "name": "Empty", "values": [] }]
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyEnum(name) if name == "Empty"));
    }

    #[test]
    fn loads_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(
            &path,
            "models:\n  - name: Tag\n    fields:\n      - name: id\n        type: Int\n        isId: true\n      - name: label\n        type: String\n",
        )
        .unwrap();

        let schema = load_schema_file(Some(&path)).unwrap();
        assert_eq!(schema.model_names(), vec!["Tag"]);
        assert!(schema.models[0].fields[0].is_id);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_schema_file(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, SchemaError::FileNotFound(_)));
    }
}
