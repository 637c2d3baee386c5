//! Declared actions.
//!
//! `#[action]` emits a `{name}_action()` constructor returning an
//! [`ActionDeclaration`] and submits a [`DeclaredAction`] into a link-time
//! collection. [`crate::Registry::load_declared`] registers everything that was
//! submitted.

use action_primitives::ToolName;

use crate::action::ActionSpec;
use crate::error::ToolResult;
use crate::signature::{Callable, compile};

/// Everything needed to compile and wrap one local action.
#[derive(Clone, Debug)]
pub struct ActionDeclaration {
    tool: String,
    callable: Callable,
    tags: Vec<String>,
    requires: Option<Vec<String>>,
    runs_on_shell: bool,
}

impl ActionDeclaration {
    /// Declares `callable` as an action of `tool`.
    #[must_use]
    pub fn new(tool: impl Into<String>, callable: Callable) -> Self {
        Self {
            tool: tool.into(),
            callable,
            tags: Vec::new(),
            requires: None,
            runs_on_shell: false,
        }
    }

    /// Adds tag labels.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Lists external programs the action depends on.
    #[must_use]
    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = Some(requires.into_iter().map(Into::into).collect());
        self
    }

    /// Marks the action as running on a workspace shell even without a
    /// context argument.
    #[must_use]
    pub fn with_runs_on_shell(mut self, runs_on_shell: bool) -> Self {
        self.runs_on_shell = runs_on_shell;
        self
    }

    /// Tool the action belongs to.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Compiles and wraps the callable.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the signature compiler and identifier
    /// validation.
    pub fn build(self) -> ToolResult<ActionSpec> {
        let tool = ToolName::new(self.tool)?;
        let compiled = compile(self.callable, self.runs_on_shell)?;
        ActionSpec::wrap(compiled, tool, self.tags, self.requires)
    }
}

/// Entry in the link-time collection of declared actions.
#[derive(Debug)]
pub struct DeclaredAction {
    declare: fn() -> ActionDeclaration,
}

impl DeclaredAction {
    /// Wraps a declaration constructor.
    #[must_use]
    pub const fn new(declare: fn() -> ActionDeclaration) -> Self {
        Self { declare }
    }

    /// Builds the declaration.
    #[must_use]
    pub fn declaration(&self) -> ActionDeclaration {
        (self.declare)()
    }
}

inventory::collect!(DeclaredAction);

/// Iterates every submitted declaration.
pub fn declared() -> impl Iterator<Item = &'static DeclaredAction> {
    inventory::iter::<DeclaredAction>.into_iter()
}
