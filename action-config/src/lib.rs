//! Configuration management for action registries.
//!
//! [`RegistryConfig`] controls how a registry resolves enum collisions and
//! whether action outputs are checked against their response models. It can
//! be deserialized from JSON, read from a file, or overlaid from the
//! environment.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{ENV_CONFLICT_POLICY, ENV_VALIDATE_RESPONSES};
pub use schema::{ConfigError, ConfigResult, ConflictPolicy, RegistryConfig};
