//! Shared error definitions for action primitives.

use thiserror::Error;

/// Result alias used throughout the action runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive action types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A tool name or action enum failed validation.
    #[error("invalid {kind} `{id}`: {reason}")]
    InvalidIdentifier {
        /// Which identifier was being validated (`tool name`, `action name`, ...).
        kind: &'static str,
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Catalog record failed validation.
    #[error("invalid action data: {reason}")]
    InvalidActionData {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
