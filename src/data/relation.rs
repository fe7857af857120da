use super::error::DataError;
use crate::schema::{get_model_by_name, Field, Model, Schema};

/// How to load a relation field: the target model and the column pairs
/// (column on the owning record, column on the related record) that link them
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLink {
    pub target: String,
    pub pairs: Vec<(String, String)>,
    pub many: bool,
}

/// Resolve a relation field of `model` into a link.
///
/// The side that declares `relationFromFields` holds the foreign key. For the
/// other side the link is taken from the matching field on the target model.
pub fn resolve_relation(schema: &Schema, model: &Model, field: &Field) -> Result<RelationLink, DataError> {
    let target_name = field
        .related_model
        .as_deref()
        .ok_or_else(|| DataError::Query(format!("{}.{} is not a relation", model.name, field.name)))?;
    let target = get_model_by_name(schema, target_name)
        .ok_or_else(|| DataError::Query(format!("Unknown related model {}", target_name)))?;

    if let (Some(from), Some(to)) = (&field.relation_from_fields, &field.relation_to_fields) {
        if !from.is_empty() {
            return Ok(RelationLink {
                target: target.name.clone(),
                pairs: from.iter().cloned().zip(to.iter().cloned()).collect(),
                many: false,
            });
        }
    }

    let opposite = target
        .fields
        .iter()
        .filter(|f| f.field_type.is_relation())
        .filter(|f| f.relation_name == field.relation_name)
        .filter(|f| f.related_model.as_deref() == Some(model.name.as_str()))
        .filter(|f| !(target.name == model.name && f.name == field.name))
        .find(|f| f.relation_from_fields.as_ref().is_some_and(|v| !v.is_empty()))
        .ok_or_else(|| {
            DataError::Query(format!(
                "Cannot resolve relation {}.{}",
                model.name, field.name
            ))
        })?;

    let from = opposite.relation_from_fields.clone().unwrap_or_default();
    let to = opposite.relation_to_fields.clone().unwrap_or_default();

    Ok(RelationLink {
        target: target.name.clone(),
        // Local column is the referenced key, remote column the foreign key
        pairs: to.into_iter().zip(from).collect(),
        many: field.is_list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::blog_schema;

    fn link(model: &str, field: &str) -> RelationLink {
        let schema = blog_schema();
        let model = get_model_by_name(&schema, model).unwrap();
        let field = model.field(field).unwrap();
        resolve_relation(&schema, model, field).unwrap()
    }

    #[test]
    fn owning_side_uses_its_own_foreign_key() {
        assert_eq!(
            link("Post", "author"),
            RelationLink {
                target: "User".into(),
                pairs: vec![("authorId".into(), "id".into())],
                many: false,
            }
        );
    }

    #[test]
    fn back_relation_borrows_the_opposite_link() {
        assert_eq!(
            link("User", "posts"),
            RelationLink {
                target: "Post".into(),
                pairs: vec![("id".into(), "authorId".into())],
                many: true,
            }
        );
        assert_eq!(
            link("Post", "comments").pairs,
            vec![("slug".to_string(), "postSlug".to_string())]
        );
    }
}
