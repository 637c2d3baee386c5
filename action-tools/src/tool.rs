//! Tool aggregation.
//!
//! A [`ToolSpec`] groups every action registered under one tool name, most
//! recently registered first. Tools are created lazily by the registry the
//! first time an action names them, or defined up front with
//! [`ToolDefinition`], which checks the definition's accessors before a
//! [`ToolSpec`] can exist.

use std::fmt;
use std::sync::Arc;

use action_primitives::ToolName;
use action_primitives::naming::{humanize, titleize};

use crate::action::ActionSpec;
use crate::error::{ToolError, ToolResult};

type ActionsFn = Box<dyn Fn() -> Vec<ActionSpec> + Send + Sync>;

/// Named group of actions sharing a namespace.
#[derive(Clone, Debug)]
pub struct ToolSpec {
    name: ToolName,
    tool_enum: String,
    display_name: String,
    description: String,
    actions: Vec<Arc<ActionSpec>>,
}

impl ToolSpec {
    /// Tool created on the fly for an action naming an unknown tool.
    pub(crate) fn lazy(name: ToolName) -> Self {
        let description = format!("{} tool.", titleize(name.as_str()));
        Self::with_description(name, description)
    }

    fn with_description(name: ToolName, description: String) -> Self {
        Self {
            tool_enum: name.enum_prefix(),
            display_name: humanize(name.as_str()),
            description,
            name,
            actions: Vec::new(),
        }
    }

    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Uppercase tool identifier, the prefix of every action enum.
    #[must_use]
    pub fn tool_enum(&self) -> &str {
        &self.tool_enum
    }

    /// Name shown to users.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Actions, most recently registered first.
    #[must_use]
    pub fn actions(&self) -> &[Arc<ActionSpec>] {
        &self.actions
    }

    /// The most recently registered action.
    #[must_use]
    pub fn primary(&self) -> Option<&Arc<ActionSpec>> {
        self.actions.first()
    }

    /// Looks up an action of this tool by enum.
    #[must_use]
    pub fn action(&self, id: &str) -> Option<&Arc<ActionSpec>> {
        self.actions
            .iter()
            .find(|spec| spec.action_enum().as_str() == id)
    }

    /// Puts `spec` at the head of the list, dropping any entry with the same enum.
    pub(crate) fn prepend(&mut self, spec: Arc<ActionSpec>) {
        self.remove(spec.action_enum().as_str());
        self.actions.insert(0, spec);
    }

    pub(crate) fn remove(&mut self, id: &str) {
        self.actions
            .retain(|existing| existing.action_enum().as_str() != id);
    }

    pub(crate) fn adopt_metadata(&mut self, other: &Self) {
        self.display_name.clone_from(&other.display_name);
        self.description.clone_from(&other.description);
    }
}

/// Up-front tool definition, validated by [`ToolDefinition::build`].
pub struct ToolDefinition {
    name: String,
    display_name: Option<String>,
    description: Option<String>,
    actions: Option<ActionsFn>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("actions", &self.actions.is_some())
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    /// Starts a definition for the named tool.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            actions: None,
        }
    }

    /// Overrides the humanized display name.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the tool description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the accessor returning the actions this tool owns.
    #[must_use]
    pub fn actions<F>(mut self, actions: F) -> Self
    where
        F: Fn() -> Vec<ActionSpec> + Send + Sync + 'static,
    {
        self.actions = Some(Box::new(actions));
        self
    }

    /// Validates the definition and materialises its actions.
    ///
    /// Actions keep the order the accessor returns them in and are
    /// re-namespaced under this tool.
    ///
    /// # Errors
    ///
    /// * [`ToolError::Identifier`] for an invalid tool name.
    /// * [`ToolError::ToolContractViolation`] when the `actions` accessor or
    ///   the description is missing, or an accessor returns an action already
    ///   bound to another tool.
    pub fn build(self) -> ToolResult<ToolSpec> {
        let name = ToolName::new(self.name)?;
        let Some(actions) = self.actions else {
            return Err(ToolError::ToolContractViolation {
                tool: name.to_string(),
                method: "actions",
            });
        };
        let description = self
            .description
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ToolError::ToolContractViolation {
                tool: name.to_string(),
                method: "description",
            })?;

        let mut tool = ToolSpec::with_description(name, description);
        if let Some(display_name) = self.display_name {
            tool.display_name = display_name;
        }

        for spec in actions() {
            let spec = spec.attach(&tool.name)?.qualified();
            tool.remove(spec.action_enum().as_str());
            tool.actions.push(Arc::new(spec));
        }
        Ok(tool)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::signature::{Callable, CallableSignature, compile};

    fn local(name: &str, tool: &str) -> ActionSpec {
        let signature = CallableSignature::new(name, Some("Does a thing."));
        let compiled = compile(Callable::signature(signature, |_| Ok(Value::Null)), false).unwrap();
        ActionSpec::wrap(compiled, ToolName::new(tool).unwrap(), ["test"], None).unwrap()
    }

    #[test]
    fn definition_requires_actions_accessor() {
        let err = ToolDefinition::new("browser")
            .description("Web browser.")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::ToolContractViolation { ref tool, method: "actions" } if tool == "browser"
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn definition_requires_description() {
        let err = ToolDefinition::new("browser")
            .actions(Vec::new)
            .build()
            .unwrap_err();
        assert!(matches!(err, ToolError::ToolContractViolation { method: "description", .. }));
    }

    #[test]
    fn definition_namespaces_actions_in_order() {
        let tool = ToolDefinition::new("file_manager")
            .description("Reads and writes files.")
            .actions(|| vec![local("open", "scratch"), local("save", "scratch")])
            .build()
            .unwrap();

        assert_eq!(tool.tool_enum(), "FILE_MANAGER");
        assert_eq!(tool.display_name(), "File manager");
        let ids: Vec<&str> = tool.actions().iter().map(|a| a.action_enum().as_str()).collect();
        assert_eq!(ids, ["FILE_MANAGER_OPEN", "FILE_MANAGER_SAVE"]);
        assert_eq!(tool.primary().unwrap().name(), "open");
        assert_eq!(tool.action("FILE_MANAGER_SAVE").unwrap().tool().as_str(), "file_manager");
        assert_eq!(tool.actions()[0].data().app().as_str(), "file_manager");
    }

    #[test]
    fn lazy_tool_description_and_prepend() {
        let name = ToolName::new("cmdmanager").unwrap();
        let mut tool = ToolSpec::lazy(name);
        assert_eq!(tool.description(), "Cmdmanager tool.");

        tool.prepend(Arc::new(local("goto", "cmdmanager").qualified()));
        tool.prepend(Arc::new(local("scroll", "cmdmanager").qualified()));
        tool.prepend(Arc::new(local("goto", "cmdmanager").qualified()));

        let ids: Vec<&str> = tool.actions().iter().map(|a| a.action_enum().as_str()).collect();
        assert_eq!(ids, ["CMDMANAGER_GOTO", "CMDMANAGER_SCROLL"]);
    }
}
