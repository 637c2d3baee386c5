//! Catalog record advertised for every registered action.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ToolName;

/// Descriptive data published alongside an action.
///
/// Local actions authored in-process are `no_auth`, `is_local` and
/// `is_runtime`; actions synthesised from a remote catalog are none of those.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionData {
    name: String,
    app: ToolName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    no_auth: bool,
    is_local: bool,
    is_runtime: bool,
    shell: bool,
}

impl ActionData {
    /// Starts building an [`ActionData`] record.
    #[must_use]
    pub fn builder(name: impl Into<String>, app: ToolName) -> ActionDataBuilder {
        ActionDataBuilder {
            name: name.into(),
            app,
            tags: BTreeSet::new(),
            no_auth: false,
            is_local: false,
            is_runtime: false,
            shell: false,
        }
    }

    /// Returns the action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning tool.
    #[must_use]
    pub fn app(&self) -> &ToolName {
        &self.app
    }

    /// Returns the tag labels, sorted.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether the action can run without an authenticated connection.
    #[must_use]
    pub const fn no_auth(&self) -> bool {
        self.no_auth
    }

    /// Whether the action was authored in-process.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.is_local
    }

    /// Whether the action was declared at runtime rather than cataloged.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        self.is_runtime
    }

    /// Whether the action needs a shell from the workspace.
    #[must_use]
    pub const fn shell(&self) -> bool {
        self.shell
    }
}

/// Builder for [`ActionData`].
#[derive(Debug)]
pub struct ActionDataBuilder {
    name: String,
    app: ToolName,
    tags: BTreeSet<String>,
    no_auth: bool,
    is_local: bool,
    is_runtime: bool,
    shell: bool,
}

impl ActionDataBuilder {
    /// Adds tag labels. Blank tags are ignored.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !tag.trim().is_empty() {
                self.tags.insert(tag);
            }
        }
        self
    }

    /// Marks the record as a local, runtime-declared action that needs no auth.
    #[must_use]
    pub fn local(mut self) -> Self {
        self.no_auth = true;
        self.is_local = true;
        self.is_runtime = true;
        self
    }

    /// Sets whether the action runs on a workspace shell.
    #[must_use]
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Consumes the builder and returns the record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidActionData`] when the action name is blank.
    pub fn build(self) -> crate::Result<ActionData> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::InvalidActionData {
                reason: format!("action name for tool `{}` cannot be empty", self.app),
            });
        }

        Ok(ActionData {
            name: self.name,
            app: self.app,
            tags: self.tags.into_iter().collect(),
            no_auth: self.no_auth,
            is_local: self.is_local,
            is_runtime: self.is_runtime,
            shell: self.shell,
        })
    }
}
