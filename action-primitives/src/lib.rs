//! Core shared types for actionkit.

#![warn(missing_docs, clippy::pedantic)]

mod action_data;
mod error;
mod ids;
pub mod naming;

/// Catalog record published for every action.
pub use action_data::{ActionData, ActionDataBuilder};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Tool namespaces and fully qualified action enums.
pub use ids::{ActionEnum, ToolName};
