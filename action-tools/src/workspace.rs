//! Invocation metadata and the workspace boundary.
//!
//! Shells, browsers, and file managers live outside this crate. Actions only
//! see them through [`Metadata`]: the reserved `workspace` slot holds a
//! [`Workspace`] whose most recent shell is injected into actions that declare
//! a context argument.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};

/// Metadata key reserved for the workspace collaborator.
pub const WORKSPACE_KEY: &str = "workspace";

/// Result of running a command on a shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Combined output of the command.
    pub output: String,
    /// Process exit status.
    pub return_code: i32,
}

/// A shell session owned by a workspace.
pub trait Shell: Send + Sync + fmt::Debug {
    /// Session identifier.
    fn id(&self) -> &str;

    /// Runs a command and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Implementations report transport or session failures as
    /// [`ToolError::Execution`].
    fn exec(&self, command: &str) -> ToolResult<CommandOutput>;
}

/// Ordered collection of shell sessions; the last one opened is the most recent.
#[derive(Clone, Debug, Default)]
pub struct Shells {
    sessions: Vec<Arc<dyn Shell>>,
}

impl Shells {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session, making it the most recent.
    pub fn push(&mut self, shell: Arc<dyn Shell>) {
        self.sessions.push(shell);
    }

    /// Most recently opened session.
    #[must_use]
    pub fn recent(&self) -> Option<Arc<dyn Shell>> {
        self.sessions.last().cloned()
    }

    /// Looks up a session by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Shell>> {
        self.sessions.iter().find(|shell| shell.id() == id).cloned()
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` when no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// External environment that actions run against.
pub trait Workspace: Send + Sync + fmt::Debug {
    /// Workspace identifier.
    fn id(&self) -> &str;

    /// Shell sessions of this workspace.
    fn shells(&self) -> &Shells;
}

/// Open mapping passed to every `execute` call.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    workspace: Option<Arc<dyn Workspace>>,
    extra: Map<String, Value>,
}

impl Metadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the workspace collaborator.
    #[must_use]
    pub fn with_workspace(mut self, workspace: Arc<dyn Workspace>) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Adds an entry. The `workspace` key is reserved and rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidSchema`] when `key` is `workspace`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> ToolResult<()> {
        let key = key.into();
        if key == WORKSPACE_KEY {
            return Err(ToolError::InvalidSchema {
                path: format!("metadata.{WORKSPACE_KEY}"),
                reason: "reserved for the workspace collaborator; use `with_workspace`".into(),
            });
        }
        self.extra.insert(key, value);
        Ok(())
    }

    /// Reads an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Attached workspace, if any.
    #[must_use]
    pub fn workspace(&self) -> Option<&Arc<dyn Workspace>> {
        self.workspace.as_ref()
    }

    /// Resolves `workspace.shells.recent` for an action that needs a shell.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::WorkspaceNotInitialized`] when no workspace is
    /// attached or the workspace has no shell.
    pub fn recent_shell(&self, action: &str) -> ToolResult<Arc<dyn Shell>> {
        let workspace = self
            .workspace
            .as_ref()
            .ok_or_else(|| ToolError::WorkspaceNotInitialized {
                action: action.to_owned(),
                detail: "no workspace attached to the invocation metadata",
            })?;

        workspace
            .shells()
            .recent()
            .ok_or_else(|| ToolError::WorkspaceNotInitialized {
                action: action.to_owned(),
                detail: "workspace has no open shell",
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingShell {
        pub(crate) id: String,
        pub(crate) commands: Mutex<Vec<String>>,
    }

    impl RecordingShell {
        pub(crate) fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_owned(),
                commands: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl Shell for RecordingShell {
        fn id(&self) -> &str {
            &self.id
        }

        fn exec(&self, command: &str) -> ToolResult<CommandOutput> {
            self.commands.lock().unwrap().push(command.to_owned());
            Ok(CommandOutput {
                output: format!("{}$ {command}", self.id),
                return_code: 0,
            })
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct TestWorkspace {
        pub(crate) shells: Shells,
    }

    impl Workspace for TestWorkspace {
        fn id(&self) -> &str {
            "test"
        }

        fn shells(&self) -> &Shells {
            &self.shells
        }
    }

    pub(crate) fn metadata_with(shells: &[Arc<RecordingShell>]) -> Metadata {
        let mut workspace = TestWorkspace::default();
        for shell in shells {
            workspace.shells.push(shell.clone());
        }
        Metadata::new().with_workspace(Arc::new(workspace))
    }
}
