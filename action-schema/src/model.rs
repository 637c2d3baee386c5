//! Typed request/response models.
//!
//! A [`TypedModel`] is a named record contract: an ordered list of
//! [`FieldDescriptor`]s, each with a [`FieldType`] and a [`Requirement`].
//! Models are built once (by the synthesizer, the signature compiler, or by
//! hand for record types) and shared behind `Arc`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use jsonschema::error::ValidationErrorKind;
use serde_json::{Map, Value, json};

use crate::error::{FieldIssue, SchemaError, SchemaResult, ValidationError};

/// Semantic type of a model field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// Whole number.
    Integer,
    /// 64-bit float; integers are accepted.
    Number,
    /// Boolean flag.
    Boolean,
    /// Ordered sequence with a uniform item type.
    Array(Box<FieldType>),
    /// Nested record.
    Object(Arc<TypedModel>),
    /// Any JSON value.
    Any,
}

impl FieldType {
    /// Wraps a model as a nested record type.
    #[must_use]
    pub fn record(model: Arc<TypedModel>) -> Self {
        Self::Object(model)
    }

    /// Returns the nested model when this is a record type.
    #[must_use]
    pub fn as_record(&self) -> Option<&Arc<TypedModel>> {
        match self {
            Self::Object(model) => Some(model),
            _ => None,
        }
    }

    /// JSON-Schema `type` keyword, `None` for [`FieldType::Any`].
    #[must_use]
    pub const fn json_type(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array(_) => Some("array"),
            Self::Object(_) => Some("object"),
            Self::Any => None,
        }
    }

    /// Type-appropriate fallback used for optional fields without a default.
    #[must_use]
    pub fn fallback_default(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Integer => json!(0),
            Self::Number => json!(0.0),
            Self::Boolean => Value::Bool(false),
            Self::Array(_) => Value::Array(Vec::new()),
            Self::Object(_) => Value::Object(Map::new()),
            Self::Any => Value::Null,
        }
    }

    fn validation_node(&self, nullable: bool) -> Value {
        let mut node = match self {
            Self::Any => return json!({}),
            Self::Array(item) => json!({ "type": "array", "items": item.validation_node(false) }),
            Self::Object(model) => validation_schema(&model.fields),
            other => json!({ "type": other.json_type() }),
        };
        if nullable {
            let kind = node["type"].take();
            node["type"] = json!([kind, "null"]);
        }
        node
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn normalize(&self, value: &Value) -> Value {
        match (self, value) {
            (Self::Integer, Value::Number(number)) if number.is_f64() => number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .map_or_else(|| value.clone(), |float| json!(float as i64)),
            (Self::Array(item), Value::Array(items)) => {
                Value::Array(items.iter().map(|value| item.normalize(value)).collect())
            }
            (Self::Object(model), Value::Object(object)) => {
                Value::Object(model.fill_defaults(object))
            }
            _ => value.clone(),
        }
    }
}

/// Whether a field must be supplied.
///
/// Encodes the invariant that a default exists only for optional fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Requirement {
    /// Must be present in every payload.
    Required,
    /// May be omitted; `default` is substituted.
    Optional {
        /// Value used when the field is absent.
        default: Value,
    },
}

/// One field of a [`TypedModel`].
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    title: Option<String>,
    field_type: FieldType,
    requirement: Requirement,
    nullable: bool,
    description: String,
}

impl FieldDescriptor {
    /// Declares a required field.
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: None,
            field_type,
            requirement: Requirement::Required,
            nullable: false,
            description: description.into(),
        }
    }

    /// Declares an optional field with the given default.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        field_type: FieldType,
        default: Value,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: None,
            field_type,
            requirement: Requirement::Optional { default },
            nullable: false,
            description: description.into(),
        }
    }

    /// Attaches a display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Lets payloads carry an explicit `null` for this field.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Field name as it appears in payloads.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional display title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Semantic type.
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Required/optional flag with default.
    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Returns `true` for required fields.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self.requirement, Requirement::Required)
    }

    /// Returns `true` when `null` is an accepted value.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Default value of an optional field.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        match &self.requirement {
            Requirement::Required => None,
            Requirement::Optional { default } => Some(default),
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Named, validated record type.
///
/// Carries a compiled JSON-Schema validator built from its fields.
#[derive(Clone)]
pub struct TypedModel {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDescriptor>,
    validator: Arc<JSONSchema>,
}

impl fmt::Debug for TypedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedModel")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TypedModel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.fields == other.fields
    }
}

impl TypedModel {
    /// Starts building a model with the given type name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TypedModelBuilder {
        TypedModelBuilder {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Type name (`GotoRequest`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional model-level description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// `(field name, description)` pairs in declaration order.
    #[must_use]
    pub fn field_descriptions(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), field.description.as_str()))
            .collect()
    }

    /// Validates a payload and returns it with defaults filled in.
    ///
    /// Unknown keys are dropped. `null` is accepted only for nullable fields.
    /// Integral floats sent for integer fields are narrowed to integers.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every missing required field and
    /// every type mismatch, including those inside nested records.
    pub fn validate(&self, payload: &Value) -> Result<Value, ValidationError> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationError::single(
                &self.name,
                "$",
                format!("expected object, found {}", json_kind(payload)),
            ));
        };

        if let Err(errors) = self.validator.validate(payload) {
            return Err(ValidationError {
                model: self.name.clone(),
                issues: errors.map(|error| self.issue(&error)).collect(),
            });
        }
        Ok(Value::Object(self.fill_defaults(object)))
    }

    fn issue(&self, error: &jsonschema::ValidationError<'_>) -> FieldIssue {
        let mut path = self.render_path(&error.instance_path.to_string());
        let reason = match &error.kind {
            ValidationErrorKind::Required { property } => {
                let property = property.as_str().unwrap_or_default();
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(property);
                "field required".to_owned()
            }
            _ => error.to_string(),
        };
        if path.is_empty() {
            path.push('$');
        }
        FieldIssue { path, reason }
    }

    /// Turns a JSON pointer (`/tags/1`) into a dotted field path (`tags[1]`).
    fn render_path(&self, pointer: &str) -> String {
        let mut path = String::new();
        let mut model = Some(self);
        let mut item: Option<&FieldType> = None;

        for segment in pointer.split('/').skip(1) {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            let next = if let Some(item_type) = item.take() {
                path.push_str(&format!("[{segment}]"));
                Some(item_type)
            } else {
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(&segment);
                model
                    .and_then(|model| model.field(&segment))
                    .map(FieldDescriptor::field_type)
            };

            model = None;
            match next {
                Some(FieldType::Array(inner)) => item = Some(inner.as_ref()),
                Some(FieldType::Object(nested)) => model = Some(nested.as_ref()),
                _ => {}
            }
        }
        path
    }

    fn fill_defaults(&self, object: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = match (object.get(&field.name), &field.requirement) {
                    (Some(value), _) => field.field_type.normalize(value),
                    (None, Requirement::Optional { default }) => default.clone(),
                    (None, Requirement::Required) => return None,
                };
                Some((field.name.clone(), value))
            })
            .collect()
    }

    /// Documentation view in the catalog's parameter-schema shape.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut node = match &field.field_type {
                FieldType::Object(model) => model.to_json_schema(),
                other => type_node(other),
            };
            if let Value::Object(map) = &mut node {
                map.insert(
                    "title".into(),
                    Value::String(field.title.clone().unwrap_or_else(|| {
                        action_primitives::naming::titleize(&field.name)
                    })),
                );
                map.insert(
                    "description".into(),
                    Value::String(field.description.clone()),
                );
                match &field.requirement {
                    Requirement::Required => required.push(Value::String(field.name.clone())),
                    Requirement::Optional { default } => {
                        map.insert("default".into(), default.clone());
                    }
                }
            }
            properties.insert(field.name.clone(), node);
        }

        let mut schema = Map::new();
        schema.insert("title".into(), Value::String(self.name.clone()));
        schema.insert("type".into(), Value::String("object".into()));
        if let Some(description) = &self.description {
            schema.insert("description".into(), Value::String(description.clone()));
        }
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), Value::Array(required));
        Value::Object(schema)
    }
}

/// Builder for [`TypedModel`].
#[derive(Debug)]
pub struct TypedModelBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl TypedModelBuilder {
    /// Sets the model description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Finalises the model.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidModelName`] for a blank or spaced name,
    /// [`SchemaError::DuplicateField`] for repeated field names, and
    /// [`SchemaError::MissingRequiredField`] when a required field has no
    /// description.
    pub fn build(self) -> SchemaResult<TypedModel> {
        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidModelName {
                path: self.name.clone(),
                reason: "model names must be non-empty and contain no whitespace".into(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.is_required() && field.description.trim().is_empty() {
                return Err(SchemaError::MissingRequiredField {
                    path: format!("{}.{}", self.name, field.name),
                    reason: "required fields need a description".into(),
                });
            }
        }

        let schema = validation_schema(&self.fields);
        let validator = JSONSchema::compile(&schema).map_err(|err| SchemaError::Validator {
            model: self.name.clone(),
            reason: err.to_string(),
        })?;

        Ok(TypedModel {
            name: self.name,
            description: self.description,
            fields: self.fields,
            validator: Arc::new(validator),
        })
    }
}

fn validation_schema(fields: &[FieldDescriptor]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                field.field_type.validation_node(field.nullable),
            )
        })
        .collect();
    let required: Vec<&str> = fields
        .iter()
        .filter(|field| field.is_required())
        .map(FieldDescriptor::name)
        .collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn type_node(field_type: &FieldType) -> Value {
    let mut node = Map::new();
    if let Some(kind) = field_type.json_type() {
        node.insert("type".into(), Value::String(kind.into()));
    }
    if let FieldType::Array(item) = field_type {
        if **item != FieldType::Any {
            let items = match item.as_ref() {
                FieldType::Object(model) => model.to_json_schema(),
                other => type_node(other),
            };
            node.insert("items".into(), items);
        }
    }
    Value::Object(node)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> Arc<TypedModel> {
        Arc::new(
            TypedModel::builder("Position")
                .field(FieldDescriptor::required("line", FieldType::Integer, "line"))
                .field(FieldDescriptor::optional(
                    "column",
                    FieldType::Integer,
                    json!(0),
                    "column",
                ))
                .build()
                .unwrap(),
        )
    }

    fn open_request() -> TypedModel {
        TypedModel::builder("OpenRequest")
            .field(FieldDescriptor::required("file_name", FieldType::String, "file to open"))
            .field(FieldDescriptor::optional(
                "tags",
                FieldType::Array(Box::new(FieldType::String)),
                json!([]),
                "labels",
            ))
            .field(FieldDescriptor::optional(
                "position",
                FieldType::record(position()),
                json!({}),
                "cursor",
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn fills_defaults_and_drops_unknown_keys() {
        let normalized = open_request()
            .validate(&json!({ "file_name": "main.rs", "extra": true }))
            .unwrap();
        assert_eq!(
            normalized,
            json!({ "file_name": "main.rs", "tags": [], "position": {} })
        );
    }

    #[test]
    fn reports_all_issues_with_paths() {
        let err = open_request()
            .validate(&json!({ "tags": ["a", 1], "position": { "column": "x" } }))
            .unwrap_err();

        assert_eq!(err.model, "OpenRequest");
        assert!(err.mentions("file_name"));
        assert!(err.mentions("tags[1]"));
        assert!(err.mentions("position.line"));
        assert!(err.mentions("position.column"));
    }

    #[test]
    fn number_accepts_integers_but_integer_rejects_floats() {
        let model = TypedModel::builder("M")
            .field(FieldDescriptor::required("n", FieldType::Number, "n"))
            .field(FieldDescriptor::required("i", FieldType::Integer, "i"))
            .build()
            .unwrap();

        assert!(model.validate(&json!({ "n": 3, "i": 3 })).is_ok());
        assert_eq!(
            model.validate(&json!({ "n": 3, "i": 3.0 })).unwrap(),
            json!({ "n": 3, "i": 3 })
        );
        let err = model.validate(&json!({ "n": 3, "i": 3.5 })).unwrap_err();
        assert!(err.mentions("i"));
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn null_is_accepted_only_for_nullable_fields() {
        let model = TypedModel::builder("SearchRequest")
            .field(FieldDescriptor::optional("query", FieldType::String, json!(""), "query"))
            .field(
                FieldDescriptor::optional("limit", FieldType::Integer, Value::Null, "limit")
                    .with_nullable(true),
            )
            .build()
            .unwrap();

        let err = model.validate(&json!({ "query": null })).unwrap_err();
        assert!(err.mentions("query"));
        assert!(!err.mentions("limit"));

        assert_eq!(
            model.validate(&json!({ "query": "fn", "limit": null })).unwrap(),
            json!({ "query": "fn", "limit": null })
        );
        assert_eq!(
            model.validate(&json!({})).unwrap(),
            json!({ "query": "", "limit": null })
        );
    }

    #[test]
    fn nested_nulls_are_reported_with_their_path() {
        let err = open_request()
            .validate(&json!({ "file_name": "main.rs", "position": { "line": null } }))
            .unwrap_err();
        assert!(err.mentions("position.line"));
        assert_eq!(err.issues.len(), 1);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = open_request().validate(&json!("main.rs")).unwrap_err();
        assert!(err.mentions("$"));
    }

    #[test]
    fn builder_rejects_duplicates_and_blank_required_descriptions() {
        let err = TypedModel::builder("M")
            .field(FieldDescriptor::required("a", FieldType::String, "a"))
            .field(FieldDescriptor::required("a", FieldType::String, "a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));

        let err = TypedModel::builder("M")
            .field(FieldDescriptor::required("a", FieldType::String, " "))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingRequiredField { path, .. } if path == "M.a"));

        assert!(TypedModel::builder("Bad Name").build().is_err());
    }

    #[test]
    fn json_schema_view_marks_required_and_defaults() {
        let schema = open_request().to_json_schema();
        assert_eq!(schema["title"], "OpenRequest");
        assert_eq!(schema["required"], json!(["file_name"]));
        assert_eq!(schema["properties"]["file_name"]["title"], "File Name");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["properties"]["position"]["type"], "object");
        assert_eq!(
            schema["properties"]["position"]["properties"]["column"]["default"],
            json!(0)
        );
        assert!(schema["properties"]["file_name"].get("default").is_none());
    }
}
