//! Typed models and the schema synthesizer.
//!
//! Remote catalogs describe action parameters as JSON-Schema-like trees
//! ([`ParameterSchema`]); [`synthesize`] turns those into [`TypedModel`]s, the
//! same contract the signature compiler in `action-tools` produces for local
//! functions. Models validate request payloads and render a documentation view
//! back to the catalog shape.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod model;
mod schema;
mod synth;
mod types;

pub use error::{FieldIssue, SchemaError, SchemaResult, ValidationError};
pub use model::{FieldDescriptor, FieldType, Requirement, TypedModel, TypedModelBuilder};
pub use schema::ParameterSchema;
pub use synth::synthesize;
pub use types::SchemaType;
