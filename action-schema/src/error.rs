//! Error types for schema synthesis and model validation.

use std::fmt;

use thiserror::Error;

/// Result alias for synthesis and model construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while turning a schema into a [`crate::TypedModel`].
///
/// Every variant carries the dotted path of the offending node
/// (`Goto.position.line_number`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A leaf declared a `type` outside the supported primitive set.
    #[error("unsupported schema type `{kind}` at `{path}`")]
    UnsupportedSchemaType {
        /// Path of the property.
        path: String,
        /// The `type` value found in the schema.
        kind: String,
    },

    /// A node that must describe a record was not of type `object`.
    #[error("expected an object schema at `{path}`, found `{kind}`")]
    ExpectedObject {
        /// Path of the node.
        path: String,
        /// The `type` value found in the schema.
        kind: String,
    },

    /// A mandatory property or its description could not be resolved.
    #[error("missing required field at `{path}`: {reason}")]
    MissingRequiredField {
        /// Path of the field.
        path: String,
        /// What was missing.
        reason: String,
    },

    /// The model title does not produce a usable type name.
    #[error("invalid model name at `{path}`: {reason}")]
    InvalidModelName {
        /// Path of the node.
        path: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// Two fields of the same model share a name.
    #[error("duplicate field `{field}` in model `{model}`")]
    DuplicateField {
        /// Model being built.
        model: String,
        /// Repeated field name.
        field: String,
    },

    /// The generated validation schema was rejected by the validator.
    #[error("model `{model}` does not compile to a validator: {reason}")]
    Validator {
        /// Model being built.
        model: String,
        /// Compiler message.
        reason: String,
    },

    /// Raw JSON did not have the parameter-schema shape.
    #[error("malformed parameter schema: {reason}")]
    Malformed {
        /// Deserializer message.
        reason: String,
    },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path inside the payload (`position.line_number`).
    pub path: String,
    /// Short diagnostic.
    pub reason: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Payload rejected by a [`crate::TypedModel`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{model} validation failed: {}", render_issues(.issues))]
pub struct ValidationError {
    /// Name of the model that rejected the payload.
    pub model: String,
    /// All issues found.
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub(crate) fn single(model: &str, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.to_owned(),
            issues: vec![FieldIssue {
                path: path.into(),
                reason: reason.into(),
            }],
        }
    }

    /// Returns `true` if any issue concerns the given field path.
    #[must_use]
    pub fn mentions(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

fn render_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
