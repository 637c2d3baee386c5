//! Actions synthesized from a remote catalog.
//!
//! A catalog entry carries the action name, the owning app, and a
//! [`ParameterSchema`] for its parameters. The schema synthesizer turns the
//! parameters into the request model; execution forwards the validated request
//! to a [`RemoteExecutor`], which owns transport and authentication.

use std::sync::Arc;

use action_primitives::naming::{camelize, humanize};
use action_primitives::{ActionData, ActionEnum, ToolName};
use action_schema::{FieldDescriptor, FieldType, ParameterSchema, TypedModel, synthesize};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::action::ActionSpec;
use crate::error::{ToolError, ToolResult};
use crate::signature::EntryPoint;
use crate::workspace::Metadata;

/// Boundary to whatever executes catalog actions.
pub trait RemoteExecutor: Send + Sync {
    /// Runs `action` with validated parameters.
    ///
    /// # Errors
    ///
    /// Implementations report transport and API failures as
    /// [`ToolError::Execution`].
    fn execute_action(
        &self,
        action: &ActionEnum,
        params: Value,
        metadata: &Metadata,
    ) -> ToolResult<Value>;
}

/// Catalog entry for one remote action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteActionSchema {
    /// Action name, bare (`star_repo`) or already namespaced (`GITHUB_STAR_REPO`).
    pub name: String,
    /// Owning app, used as the tool name.
    pub app_name: String,
    /// Action description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameter schema; must be an object node.
    pub parameters: ParameterSchema,
    /// Response schema, when the catalog publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ParameterSchema>,
    /// Tag labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RemoteActionSchema {
    /// Parses a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidSchema`] when the JSON does not have the
    /// catalog shape.
    pub fn from_value(value: Value) -> ToolResult<Self> {
        serde_json::from_value(value).map_err(|err| ToolError::InvalidSchema {
            path: "$".into(),
            reason: err.to_string(),
        })
    }

    /// Synthesizes the models and binds execution to `executor`.
    ///
    /// # Errors
    ///
    /// Returns identifier errors for bad app or action names and schema errors
    /// (scoped to `app/name`) from the synthesizer.
    pub fn into_action(self, executor: Arc<dyn RemoteExecutor>) -> ToolResult<ActionSpec> {
        let scope = format!("{}/{}", self.app_name, self.name);
        let tool = ToolName::new(self.app_name.as_str())?;

        let local = ActionEnum::local(&self.name)?;
        let catalog_form = !self.name.chars().any(|c| c.is_ascii_lowercase());
        let id = if catalog_form && local.is_qualified_for(&tool) {
            local
        } else {
            local.qualify(&tool)
        };

        let request = synthesize(&self.parameters).map_err(|err| ToolError::from(err).within(&scope))?;
        let response = match &self.response {
            Some(schema) => synthesize(schema).map_err(|err| ToolError::from(err).within(&scope))?,
            None => default_response(&self.name).map_err(|err| ToolError::from(err).within(&scope))?,
        };

        let description = self
            .description
            .clone()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| self.parameters.description().map(str::to_owned))
            .unwrap_or_else(|| humanize(&self.name.to_ascii_lowercase()));

        let data = ActionData::builder(&self.name, tool).tags(self.tags).build()?;

        debug!(
            action = %id,
            request = request.name(),
            response = response.name(),
            "synthesized remote action"
        );

        let target = id.clone();
        let entry: EntryPoint = Arc::new(move |params: Value, metadata: &Metadata| {
            executor.execute_action(&target, params, metadata)
        });

        Ok(ActionSpec::from_parts(
            self.name,
            description,
            id,
            data,
            Arc::new(request),
            Arc::new(response),
            entry,
        ))
    }
}

fn default_response(name: &str) -> action_schema::SchemaResult<TypedModel> {
    TypedModel::builder(format!("{}Response", camelize(&name.to_ascii_lowercase())))
        .field(FieldDescriptor::optional(
            "data",
            FieldType::Any,
            Value::Object(Map::new()),
            "Data from the action execution",
        ))
        .field(FieldDescriptor::optional(
            "successful",
            FieldType::Boolean,
            Value::Bool(false),
            "Whether or not the action execution was successful or not",
        ))
        .field(FieldDescriptor::optional(
            "error",
            FieldType::String,
            Value::String(String::new()),
            "Error if any occurred during the execution of the action",
        )
        .with_nullable(true))
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl RemoteExecutor for Recorder {
        fn execute_action(
            &self,
            action: &ActionEnum,
            params: Value,
            _metadata: &Metadata,
        ) -> ToolResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((action.to_string(), params.clone()));
            Ok(json!({ "data": params, "successful": true }))
        }
    }

    fn star_repo() -> Value {
        json!({
            "name": "GITHUB_STAR_REPO",
            "appName": "github",
            "description": "Star a repository.",
            "tags": ["repos"],
            "parameters": {
                "title": "StarRepoRequest",
                "type": "object",
                "properties": {
                    "owner": { "type": "string", "title": "Owner", "description": "repository owner" },
                    "repo": { "type": "string", "title": "Repo", "description": "repository name" }
                },
                "required": ["owner", "repo"]
            }
        })
    }

    #[test]
    fn builds_remote_action() {
        let recorder = Arc::new(Recorder::default());
        let spec = RemoteActionSchema::from_value(star_repo())
            .unwrap()
            .into_action(recorder.clone())
            .unwrap();

        assert_eq!(spec.action_enum().as_str(), "GITHUB_STAR_REPO");
        assert_eq!(spec.tool().as_str(), "github");
        assert_eq!(spec.description(), "Star a repository.");
        assert!(!spec.is_local() && !spec.is_runtime() && !spec.data().no_auth());
        assert_eq!(spec.request_model().name(), "StarRepoRequest");
        assert_eq!(spec.response_model().name(), "GithubStarRepoResponse");

        let out = spec
            .execute(&json!({ "owner": "octo", "repo": "hello" }), &Metadata::new())
            .unwrap();
        assert_eq!(out["successful"], true);
        assert_eq!(out["error"], "");
        assert_eq!(
            recorder.calls.lock().unwrap()[0],
            (
                "GITHUB_STAR_REPO".to_owned(),
                json!({ "owner": "octo", "repo": "hello" })
            )
        );
    }

    #[test]
    fn bare_names_are_namespaced() {
        let mut entry = star_repo();
        entry["name"] = json!("star_repo");
        let spec = RemoteActionSchema::from_value(entry)
            .unwrap()
            .into_action(Arc::new(Recorder::default()))
            .unwrap();
        assert_eq!(spec.action_enum().as_str(), "GITHUB_STAR_REPO");
        assert_eq!(spec.response_model().name(), "StarRepoResponse");
    }

    #[test]
    fn bare_name_sharing_the_tool_prefix_keeps_its_namespace() {
        let mut entry = star_repo();
        entry["name"] = json!("github_star");
        let spec = RemoteActionSchema::from_value(entry)
            .unwrap()
            .into_action(Arc::new(Recorder::default()))
            .unwrap();
        assert_eq!(spec.action_enum().as_str(), "GITHUB_GITHUB_STAR");
        assert_eq!(spec.name(), "github_star");
    }

    #[test]
    fn remote_response_accepts_a_null_error() {
        let spec = RemoteActionSchema::from_value(star_repo())
            .unwrap()
            .into_action(Arc::new(Recorder::default()))
            .unwrap();
        let response = spec
            .response_model()
            .validate(&json!({ "successful": true, "error": null }))
            .unwrap();
        assert_eq!(response["error"], Value::Null);
    }

    #[test]
    fn schema_errors_are_scoped_to_the_action() {
        let mut entry = star_repo();
        entry["parameters"]["properties"]["owner"]["type"] = json!("datetime");
        let err = RemoteActionSchema::from_value(entry)
            .unwrap()
            .into_action(Arc::new(Recorder::default()))
            .unwrap_err();

        assert!(matches!(
            err,
            ToolError::UnsupportedSchemaType { ref path, ref kind }
                if path == "github/GITHUB_STAR_REPO:StarRepoRequest.owner" && kind == "datetime"
        ));
    }

    #[test]
    fn malformed_entry_is_rejected() {
        let err = RemoteActionSchema::from_value(json!({ "name": "x" })).unwrap_err();
        assert!(matches!(err, ToolError::InvalidSchema { .. }));
    }
}
