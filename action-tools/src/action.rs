//! Action wrapper.
//!
//! An [`ActionSpec`] binds a compiled entry point to its models and identity
//! (name, owning tool, tags, enum). It is pure construction: wrapping performs
//! no I/O. Execution validates the request against the request model, calls the
//! entry point, and validates the response.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use action_primitives::{ActionData, ActionEnum, ToolName};
use action_schema::TypedModel;
use serde_json::Value;
use tracing::debug;

use crate::error::{ToolError, ToolResult};
use crate::signature::{CompiledCallable, EntryPoint};
use crate::workspace::Metadata;

/// Identity and contract of one operation.
#[derive(Clone)]
pub struct ActionSpec {
    name: String,
    display_name: String,
    description: String,
    tool: ToolName,
    id: ActionEnum,
    qualified: bool,
    tags: BTreeSet<String>,
    request: Arc<TypedModel>,
    response: Arc<TypedModel>,
    runs_on_shell: bool,
    requires: Option<Vec<String>>,
    data: ActionData,
    entry: EntryPoint,
    derived_models: Vec<String>,
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("enum", &self.id)
            .field("tool", &self.tool)
            .field("tags", &self.tags)
            .field("request", &self.request.name())
            .field("response", &self.response.name())
            .field("runs_on_shell", &self.runs_on_shell)
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

impl ActionSpec {
    /// Wraps a compiled local callable. The enum is the uppercased name until
    /// the action is attached to its tool by the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Identifier`] when the name is not a valid action
    /// identifier.
    pub fn wrap<I, S>(
        compiled: CompiledCallable,
        tool: ToolName,
        tags: I,
        requires: Option<Vec<String>>,
    ) -> ToolResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let CompiledCallable {
            name,
            description,
            entry,
            request,
            response,
            runs_on_shell,
            derived_models,
        } = compiled;

        let id = ActionEnum::local(&name)?;
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(Into::into)
            .filter(|tag: &String| !tag.trim().is_empty())
            .collect();
        let data = ActionData::builder(&name, tool.clone())
            .tags(tags.iter().cloned())
            .local()
            .shell(runs_on_shell)
            .build()?;

        Ok(Self {
            display_name: name.clone(),
            name,
            description,
            tool,
            id,
            qualified: false,
            tags,
            request,
            response,
            runs_on_shell,
            requires,
            data,
            entry,
            derived_models,
        })
    }

    /// Assembles a spec whose enum and catalog record are already final.
    pub(crate) fn from_parts(
        name: String,
        description: String,
        id: ActionEnum,
        data: ActionData,
        request: Arc<TypedModel>,
        response: Arc<TypedModel>,
        entry: EntryPoint,
    ) -> Self {
        Self {
            display_name: name.clone(),
            name,
            description,
            tool: data.app().clone(),
            qualified: id.is_qualified_for(data.app()),
            id,
            tags: data.tags().iter().cloned().collect(),
            request,
            response,
            runs_on_shell: data.shell(),
            requires: None,
            data,
            entry,
            derived_models: Vec::new(),
        }
    }

    /// Moves an unqualified action under `tool`, rebuilding its catalog record.
    pub(crate) fn attach(mut self, tool: &ToolName) -> ToolResult<Self> {
        if &self.tool == tool {
            return Ok(self);
        }
        if self.qualified {
            return Err(ToolError::ToolContractViolation {
                tool: tool.to_string(),
                method: "actions",
            });
        }

        let mut data = ActionData::builder(&self.name, tool.clone())
            .tags(self.tags.iter().cloned())
            .shell(self.data.shell());
        if self.data.is_local() {
            data = data.local();
        }
        self.data = data.build()?;
        self.tool = tool.clone();
        Ok(self)
    }

    /// Re-namespaces the enum to `{TOOL}_{ENUM}`. Idempotent.
    pub(crate) fn qualified(mut self) -> Self {
        if !self.qualified {
            self.id = self.id.qualify(&self.tool);
            self.qualified = true;
        }
        self
    }

    /// Action name, unique within its tool.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name shown to users.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Owning tool.
    #[must_use]
    pub fn tool(&self) -> &ToolName {
        &self.tool
    }

    /// Enum identifier; `{TOOL}_{NAME}` once registered.
    #[must_use]
    pub fn action_enum(&self) -> &ActionEnum {
        &self.id
    }

    /// Tag labels, sorted.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Request model.
    #[must_use]
    pub fn request_model(&self) -> &Arc<TypedModel> {
        &self.request
    }

    /// Response model.
    #[must_use]
    pub fn response_model(&self) -> &Arc<TypedModel> {
        &self.response
    }

    /// Whether the action needs a workspace shell.
    #[must_use]
    pub fn runs_on_shell(&self) -> bool {
        self.runs_on_shell
    }

    /// External programs the action depends on.
    #[must_use]
    pub fn requires(&self) -> Option<&[String]> {
        self.requires.as_deref()
    }

    /// Catalog record.
    #[must_use]
    pub fn data(&self) -> &ActionData {
        &self.data
    }

    /// Whether the action was authored in-process.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.data.is_local()
    }

    /// Whether the action was declared at runtime.
    #[must_use]
    pub fn is_runtime(&self) -> bool {
        self.data.is_runtime()
    }

    pub(crate) fn derived_models(&self) -> &[String] {
        &self.derived_models
    }

    /// Validates `request`, runs the action, and validates the response.
    ///
    /// # Errors
    ///
    /// * [`ToolError::InvalidRequest`] before the body runs.
    /// * [`ToolError::WorkspaceNotInitialized`], [`ToolError::InvalidArgument`]
    ///   or [`ToolError::Execution`] from the body.
    /// * [`ToolError::InvalidResponse`] when the body output does not match the
    ///   response model.
    pub fn execute(&self, request: &Value, metadata: &Metadata) -> ToolResult<Value> {
        self.execute_with(request, metadata, true)
    }

    /// Like [`ActionSpec::execute`], optionally skipping response validation.
    ///
    /// # Errors
    ///
    /// See [`ActionSpec::execute`].
    pub fn execute_with(
        &self,
        request: &Value,
        metadata: &Metadata,
        validate_response: bool,
    ) -> ToolResult<Value> {
        let request = self
            .request
            .validate(request)
            .map_err(|source| ToolError::InvalidRequest {
                action: self.id.to_string(),
                source,
            })?;

        debug!(action = %self.id, tool = %self.tool, "executing action");
        let response = (self.entry)(request, metadata).map_err(|err| err.for_action(&self.id))?;

        if !validate_response {
            return Ok(response);
        }
        self.response
            .validate(&response)
            .map_err(|source| ToolError::InvalidResponse {
                action: self.id.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use action_schema::{FieldDescriptor, FieldType};
    use serde_json::json;

    use super::*;
    use crate::signature::{Callable, CallableSignature, ParamSpec, compile};

    fn tool() -> ToolName {
        ToolName::new("editor").unwrap()
    }

    fn scroll(calls: Arc<AtomicUsize>) -> ActionSpec {
        let signature = CallableSignature::new("scroll", Some("Scroll the view.\n:param lines: lines to move"))
            .param(ParamSpec::of::<i64>("lines"))
            .returns_of::<i64>();
        let callable = Callable::signature(signature, move |mut args| {
            calls.fetch_add(1, Ordering::SeqCst);
            let lines: i64 = args.take("lines")?;
            args.output(&(lines * 2))
        });
        ActionSpec::wrap(compile(callable, false).unwrap(), tool(), ["view", ""], None).unwrap()
    }

    #[test]
    fn wrap_sets_identity_and_local_data() {
        let spec = scroll(Arc::default());
        assert_eq!(spec.name(), "scroll");
        assert_eq!(spec.display_name(), "scroll");
        assert_eq!(spec.description(), "Scroll the view.");
        assert_eq!(spec.action_enum().as_str(), "SCROLL");
        assert_eq!(spec.tags().iter().collect::<Vec<_>>(), ["view"]);
        assert!(spec.is_local() && spec.is_runtime() && spec.data().no_auth());
        assert!(!spec.runs_on_shell());

        let spec = spec.qualified().qualified();
        assert_eq!(spec.action_enum().as_str(), "EDITOR_SCROLL");
    }

    #[test]
    fn execute_validates_before_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let spec = scroll(Arc::clone(&calls)).qualified();

        let err = spec
            .execute(&json!({ "lines": "ten" }), &Metadata::new())
            .unwrap_err();
        assert!(matches!(&err, ToolError::InvalidRequest { action, source }
            if action == "EDITOR_SCROLL" && source.mentions("lines")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let out = spec.execute(&json!({ "lines": 4 }), &Metadata::new()).unwrap();
        assert_eq!(out, json!({ "return": 8 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn response_mismatch_is_reported_unless_disabled() {
        let request = Arc::new(TypedModel::builder("StatusRequest").build().unwrap());
        let response = Arc::new(
            TypedModel::builder("StatusResponse")
                .field(FieldDescriptor::required("code", FieldType::Integer, "status code"))
                .build()
                .unwrap(),
        );
        let callable = Callable::simple(
            "status",
            Some("Report status."),
            FieldType::record(request),
            FieldType::record(response),
            |_, _| Ok(json!({ "code": "ok" })),
        );
        let spec = ActionSpec::wrap(compile(callable, false).unwrap(), tool(), Vec::<String>::new(), None)
            .unwrap()
            .qualified();

        let err = spec.execute(&json!({}), &Metadata::new()).unwrap_err();
        assert!(matches!(err, ToolError::InvalidResponse { .. }));
        assert_eq!(
            spec.execute_with(&json!({}), &Metadata::new(), false).unwrap(),
            json!({ "code": "ok" })
        );
    }

    #[test]
    fn body_failures_carry_the_enum() {
        let signature = CallableSignature::new("fail", Some("Always fails."));
        let callable = Callable::signature(signature, |args| Err(args.failure("disk full")));
        let spec = ActionSpec::wrap(
            compile(callable, false).unwrap(),
            tool(),
            Vec::<String>::new(),
            Some(vec!["df".into()]),
        )
        .unwrap()
        .qualified();

        assert_eq!(spec.requires(), Some(&["df".to_owned()][..]));
        let err = spec.execute(&json!({}), &Metadata::new()).unwrap_err();
        assert_eq!(err.to_string(), "action `EDITOR_FAIL` failed: disk full");
    }
}
