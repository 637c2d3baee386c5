//! Tool and action identifier types.
//!
//! The enum format `{TOOL}_{ACTION}` is persisted by catalogs and agent
//! frameworks, so it is built in exactly one place: [`ActionEnum::namespaced`].

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_SEGMENT_LEN: usize = 96;
const MAX_ENUM_LEN: usize = 2 * MAX_SEGMENT_LEN + 1;
const SEPARATOR: char = '_';

/// Name of a tool namespace, e.g. `cmdmanager` or `github`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Creates a tool name after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the name is empty, too long, or
    /// contains characters other than ASCII alphanumerics and underscores.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier("tool name", &name, MAX_SEGMENT_LEN)?;
        Ok(Self(name))
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercased form used as the enum prefix.
    #[must_use]
    pub fn enum_prefix(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl Display for ToolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ToolName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ToolName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ToolName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ToolName> for String {
    fn from(value: ToolName) -> Self {
        value.0
    }
}

/// Globally unique action identifier.
///
/// Unqualified enums (`GOTO`) exist only between wrapping and tool attachment;
/// everything stored in a registry is namespaced (`CMDMANAGER_GOTO`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionEnum(String);

impl ActionEnum {
    /// Builds the unqualified enum for an action name (`goto` becomes `GOTO`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the action name is not a valid
    /// identifier segment.
    pub fn local(action: &str) -> Result<Self> {
        validate_identifier("action name", action, MAX_SEGMENT_LEN)?;
        Ok(Self(action.to_ascii_uppercase()))
    }

    /// Builds the fully namespaced enum `{TOOL}_{ACTION}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the action name is not a valid
    /// identifier segment.
    pub fn namespaced(tool: &ToolName, action: &str) -> Result<Self> {
        Self::local(action).map(|local| local.qualify(tool))
    }

    /// Parses an enum string received from a caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the value is empty or contains
    /// anything other than uppercase ASCII letters, digits, and underscores.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_identifier("action enum", &value, MAX_ENUM_LEN)?;
        if value.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(Error::InvalidIdentifier {
                kind: "action enum",
                id: value,
                reason: "enum must be uppercase".into(),
            });
        }
        Ok(Self(value))
    }

    /// Prefixes this enum with the tool namespace.
    #[must_use]
    pub fn qualify(&self, tool: &ToolName) -> Self {
        Self(format!("{}{SEPARATOR}{}", tool.enum_prefix(), self.0))
    }

    /// Returns `true` when the enum already carries the tool prefix.
    #[must_use]
    pub fn is_qualified_for(&self, tool: &ToolName) -> bool {
        self.0
            .strip_prefix(tool.enum_prefix().as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// Returns the enum as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActionEnum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ActionEnum {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActionEnum {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ActionEnum> for String {
    fn from(value: ActionEnum) -> Self {
        value.0
    }
}

fn validate_identifier(kind: &'static str, id: &str, max_len: usize) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidIdentifier {
            kind,
            id: String::new(),
            reason: "identifier cannot be empty".into(),
        });
    }

    if id.len() > max_len {
        return Err(Error::InvalidIdentifier {
            kind,
            id: id.into(),
            reason: format!("identifier length must be <= {max_len}"),
        });
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == SEPARATOR) {
        return Err(Error::InvalidIdentifier {
            kind,
            id: id.into(),
            reason: "identifier must contain only ASCII alphanumerics or underscores".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_enum_is_upper_tool_then_action() {
        let tool = ToolName::new("cmdmanager").expect("tool");
        let id = ActionEnum::namespaced(&tool, "goto_line").expect("enum");
        assert_eq!(id.as_str(), "CMDMANAGER_GOTO_LINE");
        assert!(id.is_qualified_for(&tool));
    }

    #[test]
    fn local_enum_is_not_qualified() {
        let tool = ToolName::new("cmdmanager").expect("tool");
        let id = ActionEnum::local("goto").expect("enum");
        assert_eq!(id.as_str(), "GOTO");
        assert!(!id.is_qualified_for(&tool));
    }

    #[test]
    fn prefix_match_requires_separator() {
        let tool = ToolName::new("git").expect("tool");
        let id = ActionEnum::parse("GITHUB_STAR").expect("enum");
        assert!(!id.is_qualified_for(&tool));
    }

    #[test]
    fn rejects_namespacing_characters() {
        let err = ToolName::new("cmd-manager").expect_err("dash is not allowed");
        assert!(matches!(err, Error::InvalidIdentifier { kind: "tool name", .. }));

        let err = ActionEnum::local("open.file").expect_err("dot is not allowed");
        assert!(matches!(err, Error::InvalidIdentifier { kind: "action name", .. }));
    }

    #[test]
    fn parse_rejects_lowercase() {
        assert!(ActionEnum::parse("CMD_goto").is_err());
        assert!(ActionEnum::parse("").is_err());
        assert_eq!(
            ActionEnum::parse("CMD_GOTO").expect("enum").to_string(),
            "CMD_GOTO"
        );
    }

    #[test]
    fn serde_round_trip_validates() {
        let tool: ToolName = serde_json::from_str("\"codemap\"").expect("tool");
        assert_eq!(tool.as_str(), "codemap");
        assert!(serde_json::from_str::<ToolName>("\"code map\"").is_err());
    }

    #[test]
    fn longest_namespaced_enum_round_trips() {
        let tool = ToolName::new("t".repeat(MAX_SEGMENT_LEN)).expect("tool");
        let id = ActionEnum::namespaced(&tool, &"a".repeat(MAX_SEGMENT_LEN)).expect("enum");
        assert_eq!(id.as_str().len(), MAX_ENUM_LEN);

        let json = serde_json::to_string(&id).expect("serialize");
        let back: ActionEnum = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
        assert!(ActionEnum::parse("A".repeat(MAX_ENUM_LEN + 1)).is_err());
    }
}
