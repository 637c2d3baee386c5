//! Errors produced by action compilation, registration, and invocation.

use action_primitives::ActionEnum;
use action_schema::{SchemaError, ValidationError};
use thiserror::Error;

/// Result alias for action operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced by action compilation, registration, and invocation.
///
/// Configuration errors (everything up to [`ToolError::InvalidSchema`]) are
/// raised while building or registering an action and carry the offending
/// tool/action/property path. The remaining variants surface from `execute`
/// and carry the action enum.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A schema leaf declared a type outside the supported set.
    #[error("unsupported schema type `{kind}` at `{path}`")]
    UnsupportedSchemaType {
        /// Path of the property.
        path: String,
        /// The offending `type` value.
        kind: String,
    },

    /// A mandatory property or description was not supplied.
    #[error("missing required field at `{path}`: {reason}")]
    MissingRequiredField {
        /// Path of the field.
        path: String,
        /// What was missing.
        reason: String,
    },

    /// More than one argument asked for the execution context.
    #[error("action `{action}` declares more than one context argument: {}", .arguments.join(", "))]
    InvalidContextArgument {
        /// Action being compiled.
        action: String,
        /// All arguments marked as context.
        arguments: Vec<String>,
    },

    /// A derived request/response model name is owned by another action.
    #[error("model `{model}` derived for `{action}` is already defined by `{owner}`")]
    ModelNameCollision {
        /// Colliding model name.
        model: String,
        /// Action being registered.
        action: String,
        /// Action that already owns the name.
        owner: String,
    },

    /// A tool definition lacks a required accessor.
    #[error("tool `{tool}` must implement `{method}`")]
    ToolContractViolation {
        /// Tool being defined.
        tool: String,
        /// Missing accessor.
        method: &'static str,
    },

    /// The callable's shape cannot be compiled into an action.
    #[error("invalid signature for `{action}`: {reason}")]
    InvalidSignature {
        /// Action being compiled.
        action: String,
        /// What is wrong with the signature.
        reason: String,
    },

    /// Any other schema problem (malformed nodes, bad titles, duplicate fields).
    #[error("invalid schema at `{path}`: {reason}")]
    InvalidSchema {
        /// Path of the node.
        path: String,
        /// Underlying diagnostic.
        reason: String,
    },

    /// A second registration under an existing enum with the `reject` policy.
    #[error("action `{action}` is already registered")]
    DuplicateAction {
        /// Colliding enum.
        action: String,
    },

    /// Identifier validation failed.
    #[error(transparent)]
    Identifier(#[from] action_primitives::Error),

    /// The action needs a workspace collaborator that is not attached.
    #[error("action `{action}` cannot run: {detail}")]
    WorkspaceNotInitialized {
        /// Action being invoked.
        action: String,
        /// Which collaborator is missing.
        detail: &'static str,
    },

    /// Request payload failed validation; the body never ran.
    #[error("invalid request for `{action}`: {source}")]
    InvalidRequest {
        /// Action being invoked.
        action: String,
        /// Field-level issues.
        #[source]
        source: ValidationError,
    },

    /// A validated argument could not be decoded into its Rust type.
    #[error("invalid argument `{argument}` for `{action}`: {reason}")]
    InvalidArgument {
        /// Action being invoked.
        action: String,
        /// Argument name.
        argument: String,
        /// Decoder message.
        reason: String,
    },

    /// The body returned a payload that does not match the response model.
    #[error("invalid response from `{action}`: {source}")]
    InvalidResponse {
        /// Action being invoked.
        action: String,
        /// Field-level issues.
        #[source]
        source: ValidationError,
    },

    /// The action body reported a failure.
    #[error("action `{action}` failed: {reason}")]
    Execution {
        /// Action being invoked.
        action: String,
        /// Failure returned by the body.
        reason: String,
    },

    /// No action is registered under the enum.
    #[error("action `{action}` is not registered")]
    UnknownAction {
        /// Requested enum.
        action: String,
    },

    /// No tool is registered under the name.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },
}

impl ToolError {
    /// Creates an execution error for the given action.
    #[must_use]
    pub fn execution(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Execution {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised while building or registering actions.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSchemaType { .. }
                | Self::MissingRequiredField { .. }
                | Self::InvalidContextArgument { .. }
                | Self::ModelNameCollision { .. }
                | Self::ToolContractViolation { .. }
                | Self::InvalidSignature { .. }
                | Self::InvalidSchema { .. }
                | Self::DuplicateAction { .. }
                | Self::Identifier(_)
        )
    }

    /// Prefixes schema paths with the tool/action scope being compiled.
    #[must_use]
    pub(crate) fn within(mut self, scope: &str) -> Self {
        match &mut self {
            Self::UnsupportedSchemaType { path, .. }
            | Self::MissingRequiredField { path, .. }
            | Self::InvalidSchema { path, .. } => *path = format!("{scope}:{path}"),
            _ => {}
        }
        self
    }

    /// Replaces the action label of invocation errors with the registered enum.
    #[must_use]
    pub(crate) fn for_action(mut self, id: &ActionEnum) -> Self {
        match &mut self {
            Self::WorkspaceNotInitialized { action, .. }
            | Self::InvalidRequest { action, .. }
            | Self::InvalidArgument { action, .. }
            | Self::InvalidResponse { action, .. }
            | Self::Execution { action, .. } => *action = id.to_string(),
            _ => {}
        }
        self
    }
}

impl From<SchemaError> for ToolError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnsupportedSchemaType { path, kind } => {
                Self::UnsupportedSchemaType { path, kind }
            }
            SchemaError::MissingRequiredField { path, reason } => {
                Self::MissingRequiredField { path, reason }
            }
            SchemaError::DuplicateField { ref model, ref field } => Self::InvalidSchema {
                path: format!("{model}.{field}"),
                reason: err.to_string(),
            },
            SchemaError::Validator { ref model, .. } => Self::InvalidSchema {
                path: model.clone(),
                reason: err.to_string(),
            },
            SchemaError::ExpectedObject { ref path, .. }
            | SchemaError::InvalidModelName { ref path, .. } => Self::InvalidSchema {
                path: path.clone(),
                reason: err.to_string(),
            },
            SchemaError::Malformed { reason } => Self::InvalidSchema {
                path: "$".into(),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_keep_their_kind_and_path() {
        let err: ToolError = SchemaError::UnsupportedSchemaType {
            path: "Goto.when".into(),
            kind: "datetime".into(),
        }
        .into();
        let err = err.within("cmdmanager/goto");
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "unsupported schema type `datetime` at `cmdmanager/goto:Goto.when`"
        );
    }

    #[test]
    fn invocation_errors_are_relabelled_with_the_enum() {
        let id = ActionEnum::parse("CMDMANAGER_GOTO").unwrap();
        let err = ToolError::execution("goto", "no such line").for_action(&id);
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "action `CMDMANAGER_GOTO` failed: no such line");
    }

    #[test]
    fn context_argument_error_lists_arguments() {
        let err = ToolError::InvalidContextArgument {
            action: "goto".into(),
            arguments: vec!["shell".into(), "other".into()],
        };
        assert!(err.to_string().ends_with("shell, other"));
    }
}
