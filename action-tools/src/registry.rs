//! Registry of actions keyed by enum, aggregated into tools.
//!
//! The registry is an explicit value: build one at start-up, populate it, and
//! pass it by reference. Registration takes `&mut self`, so concurrent
//! registration has to be serialised by whoever owns the registry.

use std::collections::HashMap;
use std::sync::Arc;

use action_config::{ConflictPolicy, RegistryConfig};
use action_primitives::{ActionEnum, ToolName};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::action::ActionSpec;
use crate::declare::{ActionDeclaration, declared};
use crate::error::{ToolError, ToolResult};
use crate::remote::{RemoteActionSchema, RemoteExecutor};
use crate::tool::ToolSpec;
use crate::workspace::Metadata;

/// Actions keyed by `{TOOL}_{ACTION}` enum plus their tool groupings.
///
/// Conflicts follow the configured [`ConflictPolicy`]. Under the default
/// `replace` policy the last registration of an enum wins in the enum map and
/// in its tool's action list alike.
#[derive(Debug, Default)]
pub struct Registry {
    config: RegistryConfig,
    actions: HashMap<ActionEnum, Arc<ActionSpec>>,
    tools: HashMap<ToolName, ToolSpec>,
    tool_order: Vec<ToolName>,
    model_owners: HashMap<String, ActionEnum>,
}

impl Registry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Registers an action under `{TOOL}_{ACTION}`, creating its tool if needed.
    ///
    /// The action becomes the head of its tool's list.
    ///
    /// # Errors
    ///
    /// * [`ToolError::DuplicateAction`] when the enum exists and the policy is
    ///   `reject`.
    /// * [`ToolError::ModelNameCollision`] when a derived model name belongs to
    ///   another action.
    ///
    /// The registry is unchanged on error.
    pub fn register(&mut self, spec: ActionSpec) -> ToolResult<Arc<ActionSpec>> {
        let spec = Arc::new(spec.qualified());
        self.check(&spec)?;
        self.insert(Arc::clone(&spec));
        Ok(spec)
    }

    /// Registers a tool defined with [`crate::ToolDefinition`].
    ///
    /// The tool's description and display name replace those of an existing
    /// tool of the same name. Its actions keep their definition order at the
    /// head of the tool's list.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register`], checked for every action before any is
    /// inserted. Actions of the tool are also checked against each other.
    pub fn register_tool(&mut self, tool: ToolSpec) -> ToolResult<()> {
        let mut owners: HashMap<&str, &ActionEnum> = HashMap::new();
        for spec in tool.actions() {
            self.check(spec)?;

            let id = spec.action_enum();
            for model in spec.derived_models() {
                if let Some(owner) = owners.insert(model.as_str(), id) {
                    if owner != id {
                        return Err(collision(model, id, owner));
                    }
                }
            }
        }

        self.tool_entry(tool.name()).adopt_metadata(&tool);
        for spec in tool.actions().iter().rev() {
            self.insert(Arc::clone(spec));
        }

        info!(tool = %tool.name(), actions = tool.actions().len(), "registered tool");
        Ok(())
    }

    /// Builds and registers a declared action.
    ///
    /// # Errors
    ///
    /// Configuration errors from compilation, then those of [`Registry::register`].
    pub fn register_declaration(
        &mut self,
        declaration: ActionDeclaration,
    ) -> ToolResult<Arc<ActionSpec>> {
        let spec = declaration.build()?;
        self.register(spec)
    }

    /// Synthesizes and registers a remote catalog action.
    ///
    /// # Errors
    ///
    /// Schema errors from synthesis, then those of [`Registry::register`].
    pub fn register_remote(
        &mut self,
        schema: RemoteActionSchema,
        executor: Arc<dyn RemoteExecutor>,
    ) -> ToolResult<Arc<ActionSpec>> {
        let spec = schema.into_action(executor)?;
        self.register(spec)
    }

    /// Registers every action declared with `#[action]` in the linked crates.
    ///
    /// Returns the number of actions registered.
    ///
    /// # Errors
    ///
    /// Stops at the first declaration that fails to compile or register.
    pub fn load_declared(&mut self) -> ToolResult<usize> {
        let mut count = 0;
        for declared in declared() {
            self.register_declaration(declared.declaration())?;
            count += 1;
        }
        info!(count, "loaded declared actions");
        Ok(count)
    }

    /// Looks up an action by enum.
    #[must_use]
    pub fn get_action(&self, id: &str) -> Option<&Arc<ActionSpec>> {
        self.actions.get(id)
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    /// Looks up a tool by name, failing when it is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`].
    pub fn require_tool(&self, name: &str) -> ToolResult<&ToolSpec> {
        self.get_tool(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })
    }

    /// Actions of a tool, most recent first; empty for unknown tools.
    #[must_use]
    pub fn list_actions_for_tool(&self, name: &str) -> &[Arc<ActionSpec>] {
        self.get_tool(name)
            .map(ToolSpec::actions)
            .unwrap_or_default()
    }

    /// Tools in the order they were first created.
    pub fn tools(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tool_order
            .iter()
            .filter_map(|name| self.tools.get(name))
    }

    /// All actions, grouped by tool in tool creation order.
    pub fn actions(&self) -> impl Iterator<Item = &Arc<ActionSpec>> {
        self.tools().flat_map(|tool| tool.actions().iter())
    }

    /// Returns `true` when an action is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Executes the action registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownAction`] for unregistered enums and
    /// otherwise the errors of [`ActionSpec::execute`].
    pub fn execute(&self, id: &str, request: &Value, metadata: &Metadata) -> ToolResult<Value> {
        let spec = self
            .get_action(id)
            .ok_or_else(|| ToolError::UnknownAction {
                action: id.to_owned(),
            })?;
        spec.execute_with(request, metadata, self.config.validate_responses())
    }

    fn check(&self, spec: &ActionSpec) -> ToolResult<()> {
        let id = spec.action_enum();
        if self.config.conflict_policy() == ConflictPolicy::Reject && self.actions.contains_key(id) {
            return Err(ToolError::DuplicateAction {
                action: id.to_string(),
            });
        }

        for model in spec.derived_models() {
            if let Some(owner) = self.model_owners.get(model) {
                if owner != id {
                    return Err(collision(model, id, owner));
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, spec: Arc<ActionSpec>) {
        let id = spec.action_enum().clone();

        if let Some(previous) = self.actions.get(&id).cloned() {
            warn!(action = %id, tool = %previous.tool(), "replacing registered action");
            for model in previous.derived_models() {
                self.model_owners.remove(model);
            }
            if let Some(tool) = self.tools.get_mut(previous.tool()) {
                tool.remove(id.as_str());
            }
        }

        for model in spec.derived_models() {
            self.model_owners.insert(model.clone(), id.clone());
        }

        self.tool_entry(spec.tool()).prepend(Arc::clone(&spec));
        debug!(action = %id, tool = %spec.tool(), "indexed action");
        self.actions.insert(id, spec);
    }

    fn tool_entry(&mut self, name: &ToolName) -> &mut ToolSpec {
        if !self.tools.contains_key(name) {
            info!(tool = %name, "created tool");
            self.tool_order.push(name.clone());
        }
        self.tools
            .entry(name.clone())
            .or_insert_with(|| ToolSpec::lazy(name.clone()))
    }
}

fn collision(model: &str, action: &ActionEnum, owner: &ActionEnum) -> ToolError {
    ToolError::ModelNameCollision {
        model: model.to_owned(),
        action: action.to_string(),
        owner: owner.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::signature::{Callable, CallableSignature, ParamSpec};
    use crate::tool::ToolDefinition;

    fn declaration(tool: &str, name: &str, reply: &'static str) -> ActionDeclaration {
        let signature = CallableSignature::new(name, Some("Test action.\n:param text: input"))
            .param(ParamSpec::of::<Option<String>>("text"))
            .returns_of::<String>();
        ActionDeclaration::new(tool, Callable::signature(signature, move |args| args.output(&reply)))
    }

    fn spec(tool: &str, name: &str, reply: &'static str) -> ActionSpec {
        declaration(tool, name, reply).build().unwrap()
    }

    #[test]
    fn tool_aggregates_actions_most_recent_first() {
        let mut registry = Registry::new();
        registry.register(spec("cmdmanager", "goto", "a")).unwrap();
        registry.register(spec("cmdmanager", "scroll", "b")).unwrap();

        let tool = registry.get_tool("cmdmanager").unwrap();
        assert_eq!(tool.description(), "Cmdmanager tool.");
        let names: Vec<&str> = tool.actions().iter().map(|a| a.name()).collect();
        assert_eq!(names, ["scroll", "goto"]);
        assert_eq!(registry.list_actions_for_tool("cmdmanager").len(), 2);
        assert!(registry.list_actions_for_tool("missing").is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn last_write_wins_by_enum() {
        let mut registry = Registry::new();
        registry.register(spec("cmdmanager", "goto", "first")).unwrap();
        registry.register(spec("cmdmanager", "scroll", "other")).unwrap();
        registry.register(spec("cmdmanager", "goto", "second")).unwrap();

        assert_eq!(registry.len(), 2);
        let out = registry
            .execute("CMDMANAGER_GOTO", &json!({}), &Metadata::new())
            .unwrap();
        assert_eq!(out, json!({ "return": "second" }));

        let ids: Vec<&str> = registry
            .list_actions_for_tool("cmdmanager")
            .iter()
            .map(|a| a.action_enum().as_str())
            .collect();
        assert_eq!(ids, ["CMDMANAGER_GOTO", "CMDMANAGER_SCROLL"]);
    }

    #[test]
    fn reject_policy_keeps_the_first_registration() {
        let config = RegistryConfig::new().with_conflict_policy(ConflictPolicy::Reject);
        let mut registry = Registry::with_config(config);
        registry.register(spec("cmdmanager", "goto", "first")).unwrap();

        let err = registry.register(spec("cmdmanager", "goto", "second")).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateAction { ref action } if action == "CMDMANAGER_GOTO"));

        let out = registry
            .execute("CMDMANAGER_GOTO", &json!({}), &Metadata::new())
            .unwrap();
        assert_eq!(out, json!({ "return": "first" }));
    }

    #[test]
    fn derived_model_names_are_owned_by_one_enum() {
        let mut registry = Registry::new();
        registry.register(spec("editor", "goto", "a")).unwrap();

        let err = registry.register(spec("cmdmanager", "goto", "b")).unwrap_err();
        match err {
            ToolError::ModelNameCollision { model, action, owner } => {
                assert_eq!(model, "GotoRequest");
                assert_eq!(action, "CMDMANAGER_GOTO");
                assert_eq!(owner, "EDITOR_GOTO");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!registry.contains("CMDMANAGER_GOTO"));
        assert!(registry.get_tool("cmdmanager").is_none());
    }

    #[test]
    fn same_enum_from_another_tool_moves_the_action() {
        let mut registry = Registry::new();
        registry.register(spec("a_b", "c", "first")).unwrap();
        registry.register(spec("a", "b_c", "second")).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.list_actions_for_tool("a_b").is_empty());
        assert_eq!(registry.list_actions_for_tool("a").len(), 1);
        assert_eq!(registry.get_action("A_B_C").unwrap().tool().as_str(), "a");
    }

    #[test]
    fn registered_tool_keeps_definition_order_and_metadata() {
        let mut registry = Registry::new();
        registry.register(spec("files", "stat", "s")).unwrap();

        let tool = ToolDefinition::new("files")
            .description("File manager.")
            .actions(|| vec![spec("files", "open", "o"), spec("files", "save", "v")])
            .build()
            .unwrap();
        registry.register_tool(tool).unwrap();

        let tool = registry.get_tool("files").unwrap();
        assert_eq!(tool.description(), "File manager.");
        let names: Vec<&str> = tool.actions().iter().map(|a| a.name()).collect();
        assert_eq!(names, ["open", "save", "stat"]);
        assert_eq!(registry.tools().count(), 1);
        assert_eq!(registry.actions().count(), 3);
    }

    #[test]
    fn tool_actions_with_colliding_models_are_rejected_together() {
        let mut registry = Registry::new();
        let tool = ToolDefinition::new("t")
            .description("Test tool.")
            .actions(|| vec![spec("t", "foo_bar", "a"), spec("t", "fooBar", "b")])
            .build()
            .unwrap();

        let err = registry.register_tool(tool).unwrap_err();
        match err {
            ToolError::ModelNameCollision { model, action, owner } => {
                assert_eq!(model, "FooBarRequest");
                assert_eq!(action, "T_FOOBAR");
                assert_eq!(owner, "T_FOO_BAR");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
        assert!(registry.get_tool("t").is_none());
    }

    #[test]
    fn unknown_lookups() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        let err = registry
            .execute("NOPE_NOTHING", &json!({}), &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownAction { .. }));
        assert!(matches!(registry.require_tool("nope"), Err(ToolError::UnknownTool { .. })));
    }

    #[test]
    fn response_validation_follows_config() {
        let signature = CallableSignature::new("count", Some("Count things."))
            .returns_of::<i64>();
        let declaration =
            ActionDeclaration::new("stats", Callable::signature(signature, |_| Ok(json!("many"))));

        let mut strict = Registry::new();
        strict.register_declaration(declaration.clone()).unwrap();
        let err = strict
            .execute("STATS_COUNT", &json!({}), &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidResponse { .. }));

        let mut lenient = Registry::with_config(RegistryConfig::new().with_response_validation(false));
        lenient.register_declaration(declaration).unwrap();
        assert_eq!(
            lenient.execute("STATS_COUNT", &json!({}), &Metadata::new()).unwrap(),
            json!({ "return": "many" })
        );
    }
}
