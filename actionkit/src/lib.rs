//! Schema-driven action registration facade.
//!
//! Depend on this crate via `cargo add actionkit`. It bundles the internal
//! crates behind feature flags so embedders can pull in only the pieces they
//! need. When declaring actions through this facade, point the attribute at the
//! re-export: `#[action(tool = "...", crate = "::actionkit::tools")]`.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use action_primitives as primitives;

/// Typed models and the schema synthesizer (enabled by `schema` feature).
#[cfg(feature = "schema")]
pub use action_schema as schema;

/// Signature compiler, action wrapper, and registry (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use action_tools as tools;

/// Registry configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use action_config as config;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use action_telemetry as telemetry;
