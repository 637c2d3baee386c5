//! Action compilation, wrapping, and registration.
//!
//! Local functions go through the signature compiler ([`signature::compile`]),
//! remote catalog entries through the schema synthesizer
//! ([`RemoteActionSchema::into_action`]). Both end up as an [`ActionSpec`] with
//! a request model, a response model, and a uniform `execute(request, metadata)`
//! entry, which a [`Registry`] stores under its `{TOOL}_{ACTION}` enum and
//! groups into [`ToolSpec`]s.
//!
//! ```
//! use action_tools::{Callable, CallableSignature, ActionDeclaration, Metadata, ParamSpec, Registry};
//! use serde_json::json;
//!
//! let signature = CallableSignature::new("shout", Some("Uppercase text.\n:param text: input"))
//!     .param(ParamSpec::of::<String>("text"))
//!     .returns_of::<String>();
//! let callable = Callable::signature(signature, |mut args| {
//!     let text: String = args.take("text")?;
//!     args.output(&text.to_uppercase())
//! });
//!
//! let mut registry = Registry::new();
//! registry.register_declaration(ActionDeclaration::new("echo", callable))?;
//! let out = registry.execute("ECHO_SHOUT", &json!({ "text": "hi" }), &Metadata::new())?;
//! assert_eq!(out, json!({ "return": "HI" }));
//! # Ok::<(), action_tools::ToolError>(())
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod action;
pub mod declare;
pub mod docstring;
pub mod error;
pub mod registry;
pub mod remote;
pub mod signature;
pub mod tool;
pub mod workspace;

pub use action::ActionSpec;
pub use action_primitives::{ActionData, ActionEnum, ToolName};
pub use action_schema::{FieldDescriptor, FieldType, SchemaType, TypedModel};
pub use action_tools_macros::action;
pub use declare::{ActionDeclaration, DeclaredAction};
pub use error::{ToolError, ToolResult};
pub use registry::Registry;
pub use remote::{RemoteActionSchema, RemoteExecutor};
pub use signature::{
    Arguments, Callable, CallableSignature, CompiledCallable, EntryPoint, ParamSpec, compile,
    decode_request, encode_response,
};
pub use tool::{ToolDefinition, ToolSpec};
pub use workspace::{CommandOutput, Metadata, Shell, Shells, Workspace};

#[doc(hidden)]
pub mod __private {
    pub use inventory;
    pub use serde_json;
}
