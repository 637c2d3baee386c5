//! Schema synthesizer: parameter schema trees to [`TypedModel`]s.

use std::sync::Arc;

use action_primitives::naming::strip_spaces;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::model::{FieldDescriptor, FieldType, TypedModel};
use crate::schema::ParameterSchema;

enum Kind {
    Leaf(FieldType),
    Object,
}

fn classify(kind: &str) -> Option<Kind> {
    let leaf = match kind {
        "string" => FieldType::String,
        "number" => FieldType::Number,
        "boolean" => FieldType::Boolean,
        "array" => FieldType::Array(Box::new(FieldType::Any)),
        "object" => return Some(Kind::Object),
        _ => return None,
    };
    Some(Kind::Leaf(leaf))
}

/// Converts an object schema into a typed model, recursing into nested
/// `object` properties.
///
/// A property is required iff it is listed under `required`; a missing
/// `required` key makes every property optional. Optional properties without
/// a `default` receive the type's fallback (`""`, `0.0`, `false`, `[]`, `{}`).
///
/// # Errors
///
/// Returns [`SchemaError::UnsupportedSchemaType`] for unknown leaf types,
/// [`SchemaError::ExpectedObject`] if the root is not an object, and
/// [`SchemaError::MissingRequiredField`] when a required property has neither
/// a description nor a title. Errors carry the dotted property path.
pub fn synthesize(schema: &ParameterSchema) -> SchemaResult<TypedModel> {
    let root = strip_spaces(schema.title());
    let path = if root.is_empty() { "$".to_owned() } else { root };
    synthesize_at(schema, &path)
}

fn synthesize_at(schema: &ParameterSchema, path: &str) -> SchemaResult<TypedModel> {
    if schema.kind() != "object" {
        return Err(SchemaError::ExpectedObject {
            path: path.to_owned(),
            kind: schema.kind().to_owned(),
        });
    }

    let name = strip_spaces(schema.title());
    if name.is_empty() {
        return Err(SchemaError::InvalidModelName {
            path: path.to_owned(),
            reason: "object schemas need a title".into(),
        });
    }

    let mut builder = TypedModel::builder(name);
    if let Some(description) = schema.description() {
        builder = builder.description(description);
    }

    for (prop_name, prop) in schema.properties() {
        let prop_path = format!("{path}.{prop_name}");
        let field_type = match classify(prop.kind()) {
            Some(Kind::Leaf(leaf)) => leaf,
            Some(Kind::Object) => FieldType::record(Arc::new(synthesize_at(prop, &prop_path)?)),
            None => {
                return Err(SchemaError::UnsupportedSchemaType {
                    path: prop_path,
                    kind: prop.kind().to_owned(),
                });
            }
        };

        let description = prop
            .description()
            .unwrap_or_else(|| prop.title().trim())
            .to_owned();

        let field = if schema.is_required(prop_name) {
            if description.is_empty() {
                return Err(SchemaError::MissingRequiredField {
                    path: prop_path,
                    reason: "no description or title to describe the field".into(),
                });
            }
            FieldDescriptor::required(prop_name.as_str(), field_type, description)
        } else {
            let default = prop
                .default_value()
                .cloned()
                .unwrap_or_else(|| field_type.fallback_default());
            FieldDescriptor::optional(prop_name.as_str(), field_type, default, description)
        };

        builder = builder.field(field.with_title(strip_spaces(prop.title())));
    }

    let model = builder.build()?;
    debug!(model = model.name(), fields = model.fields().len(), "synthesized model");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(value: Value) -> ParameterSchema {
        ParameterSchema::from_value(value).expect("schema")
    }

    #[test]
    fn goto_scenario() {
        let model = synthesize(&parse(json!({
            "title": "Goto",
            "type": "object",
            "properties": {
                "line_number": {
                    "type": "number",
                    "title": "LineNumber",
                    "description": "target line"
                }
            },
            "required": ["line_number"]
        })))
        .unwrap();

        assert_eq!(model.name(), "Goto");
        assert_eq!(model.fields().len(), 1);
        let field = model.field("line_number").unwrap();
        assert_eq!(field.field_type(), &FieldType::Number);
        assert!(field.is_required());
        assert!(field.default_value().is_none());
        assert_eq!(field.description(), "target line");

        assert!(model.validate(&json!({ "line_number": 10.0 })).is_ok());
        let err = model.validate(&json!({ "line_number": "ten" })).unwrap_err();
        assert!(err.mentions("line_number"));
    }

    #[test]
    fn primitive_leaves_reflect_schema() {
        let model = synthesize(&parse(json!({
            "title": "Search Dir",
            "type": "object",
            "properties": {
                "query": { "type": "string", "title": "Query", "desc": "text to find" },
                "limit": { "type": "number", "title": "Limit", "default": 25 },
                "regex": { "type": "boolean", "title": "Regex" },
                "paths": { "type": "array", "title": "Paths" },
                "label": { "type": "string", "title": "Label" }
            },
            "required": ["query"]
        })))
        .unwrap();

        assert_eq!(model.name(), "SearchDir");
        let names: Vec<_> = model.fields().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, ["query", "limit", "regex", "paths", "label"]);

        assert_eq!(model.field("query").unwrap().description(), "text to find");
        assert_eq!(model.field("limit").unwrap().default_value(), Some(&json!(25)));
        assert_eq!(model.field("regex").unwrap().default_value(), Some(&json!(false)));
        assert_eq!(model.field("paths").unwrap().default_value(), Some(&json!([])));
        assert_eq!(model.field("label").unwrap().default_value(), Some(&json!("")));
        assert_eq!(model.field("label").unwrap().description(), "Label");
    }

    #[test]
    fn missing_required_list_makes_everything_optional() {
        let model = synthesize(&parse(json!({
            "title": "Scroll",
            "type": "object",
            "properties": {
                "direction": { "type": "string", "title": "Direction" },
                "amount": { "type": "number", "title": "Amount" }
            }
        })))
        .unwrap();

        assert!(model.fields().iter().all(|f| !f.is_required()));
        assert_eq!(model.field("amount").unwrap().default_value(), Some(&json!(0.0)));
        assert_eq!(
            model.validate(&json!({})).unwrap(),
            json!({ "direction": "", "amount": 0.0 })
        );
    }

    #[test]
    fn nested_objects_recurse_and_document_back() {
        let source = json!({
            "title": "Create Issue",
            "type": "object",
            "properties": {
                "title": { "type": "string", "title": "Title", "description": "issue title" },
                "repo": {
                    "type": "object",
                    "title": "Repo Ref",
                    "description": "target repository",
                    "properties": {
                        "owner": { "type": "string", "title": "Owner", "description": "account" },
                        "name": { "type": "string", "title": "Name", "description": "repository" }
                    },
                    "required": ["owner", "name"]
                }
            },
            "required": ["title", "repo"]
        });
        let model = synthesize(&parse(source.clone())).unwrap();

        let repo = model.field("repo").unwrap().field_type().as_record().unwrap();
        assert_eq!(repo.name(), "RepoRef");
        assert!(repo.fields().iter().all(FieldDescriptor::is_required));

        let view = model.to_json_schema();
        for (name, prop) in source["properties"].as_object().unwrap() {
            assert_eq!(view["properties"][name]["description"], prop["description"]);
        }
        for name in ["owner", "name"] {
            assert_eq!(
                view["properties"]["repo"]["properties"][name]["description"],
                source["properties"]["repo"]["properties"][name]["description"]
            );
        }

        let err = model
            .validate(&json!({ "title": "bug", "repo": { "owner": "me" } }))
            .unwrap_err();
        assert!(err.mentions("repo.name"));
    }

    #[test]
    fn unknown_leaf_type_reports_path() {
        let err = synthesize(&parse(json!({
            "title": "Outer",
            "type": "object",
            "properties": {
                "inner": {
                    "type": "object",
                    "title": "Inner",
                    "properties": { "when": { "type": "datetime", "title": "When" } }
                }
            }
        })))
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::UnsupportedSchemaType {
                path: "Outer.inner.when".into(),
                kind: "datetime".into(),
            }
        );
    }

    #[test]
    fn required_property_without_any_label_fails() {
        let err = synthesize(&parse(json!({
            "title": "Bare",
            "type": "object",
            "properties": { "x": { "type": "string", "title": " " } },
            "required": ["x"]
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingRequiredField { path, .. } if path == "Bare.x"));
    }

    #[test]
    fn root_must_be_object() {
        let err = synthesize(&parse(json!({ "title": "Text", "type": "string" }))).unwrap_err();
        assert!(matches!(err, SchemaError::ExpectedObject { .. }));
    }
}
