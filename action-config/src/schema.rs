//! Strongly typed registry configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while parsing configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting had a value outside its accepted set.
    #[error("invalid value `{value}` for {key}: expected {expected}")]
    InvalidValue {
        /// Setting name (JSON key or environment variable).
        key: String,
        /// Raw value supplied.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
    /// JSON document did not match the configuration shape.
    #[error("malformed registry config: {source}")]
    Malformed {
        /// Underlying deserializer error.
        #[from]
        source: serde_json::Error,
    },
}

/// What a registry does when an action enum is registered twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Last write wins: the new action replaces the old one in the enum map
    /// and in its tool's action list.
    #[default]
    Replace,
    /// The second registration fails and the registry is left untouched.
    Reject,
}

impl FromStr for ConflictPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> ConfigResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            _ => Err(ConfigError::InvalidValue {
                key: "conflict_policy".into(),
                value: value.into(),
                expected: "`replace` or `reject`",
            }),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::Reject => "reject",
        })
    }
}

/// Registry behaviour settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    conflict_policy: ConflictPolicy,
    validate_responses: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Replace,
            validate_responses: true,
        }
    }
}

impl RegistryConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the enum conflict policy.
    #[must_use]
    pub const fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Enables or disables response validation after `execute`.
    #[must_use]
    pub const fn with_response_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// Returns the enum conflict policy.
    #[must_use]
    pub const fn conflict_policy(self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Returns whether responses are validated.
    #[must_use]
    pub const fn validate_responses(self) -> bool {
        self.validate_responses
    }
}
