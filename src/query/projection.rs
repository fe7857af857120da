use std::collections::HashMap;

use crate::config::models::FieldConfig;
use crate::data::Projection;
use crate::schema::{get_relation_fields, Model};

/// Relation fields to load alongside each record
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeClause(pub Vec<String>);

/// Explicit allow-list of fields to return
#[derive(Debug, Clone, PartialEq)]
pub struct SelectClause(pub Vec<String>);

/// Parse a comma-separated include list, keeping only relation fields of the model
pub fn build_include_clause(model: &Model, include: Option<&str>) -> Option<IncludeClause> {
    let relations = get_relation_fields(model);
    let mut names: Vec<String> = Vec::new();

    for name in include?.split(',').map(str::trim) {
        if relations.iter().any(|f| f.name == name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    (!names.is_empty()).then_some(IncludeClause(names))
}

/// Every field except the hidden ones, or None when nothing is hidden
pub fn build_select_clause(model: &Model, fields_config: Option<&HashMap<String, FieldConfig>>) -> Option<SelectClause> {
    let hidden: Vec<&str> = fields_config?
        .iter()
        .filter(|(_, cfg)| cfg.hidden)
        .map(|(name, _)| name.as_str())
        .collect();

    if hidden.is_empty() {
        return None;
    }

    Some(SelectClause(
        model
            .fields
            .iter()
            .filter(|f| !hidden.contains(&f.name.as_str()))
            .map(|f| f.name.clone())
            .collect(),
    ))
}

/// An active select absorbs the include list; otherwise include applies alone
pub fn merge_projection(select: Option<SelectClause>, include: Option<IncludeClause>) -> Projection {
    match (select, include) {
        (Some(SelectClause(mut fields)), include) => {
            for name in include.map(|i| i.0).unwrap_or_default() {
                if !fields.contains(&name) {
                    fields.push(name);
                }
            }
            Projection::Select(fields)
        }
        (None, Some(IncludeClause(relations))) => Projection::Include(relations),
        (None, None) => Projection::Default,
    }
}
