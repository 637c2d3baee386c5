//! Signature compiler.
//!
//! Turns a [`Callable`] into a request/response model pair and a uniform
//! [`EntryPoint`]. Callables come in two shapes:
//!
//! * **simple**: the function already takes a validated request record and
//!   returns a validated response record. The declared models are passed
//!   through untouched.
//! * **signature**: the function takes individual arguments. A request model is
//!   derived from the arguments and the doc comment, and the return value is
//!   wrapped into a single-field response model unless it already is a record.
//!
//! The `#[action]` attribute builds [`Callable`]s from plain Rust functions.

use std::fmt;
use std::sync::Arc;

use action_primitives::naming::{camelize, titleize};
use action_schema::{FieldDescriptor, FieldType, SchemaType, TypedModel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::docstring::Docstring;
use crate::error::{ToolError, ToolResult};
use crate::workspace::{Metadata, Shell};

/// Uniform invocation entry: validated request payload plus metadata in,
/// response payload out.
pub type EntryPoint = Arc<dyn Fn(Value, &Metadata) -> ToolResult<Value> + Send + Sync>;

type Body = Arc<dyn Fn(Arguments) -> ToolResult<Value> + Send + Sync>;

/// One declared argument of a signature-path callable.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
}

#[derive(Clone, Debug, PartialEq)]
enum ParamKind {
    Data {
        field_type: FieldType,
        nullable: bool,
        description: Option<String>,
        default: Option<Value>,
    },
    Context,
}

impl ParamSpec {
    /// Request argument with an explicit field type. `nullable` arguments are
    /// optional with a `null` default.
    #[must_use]
    pub fn data(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Data {
                field_type,
                nullable,
                description: None,
                default: None,
            },
        }
    }

    /// Request argument typed by a Rust type.
    #[must_use]
    pub fn of<T: SchemaType>(name: impl Into<String>) -> Self {
        Self::data(name, T::field_type(), T::is_optional())
    }

    /// Execution-context argument, resolved from the invocation metadata.
    #[must_use]
    pub fn context(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Context,
        }
    }

    /// Explicit description; takes precedence over the doc comment.
    #[must_use]
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        if let ParamKind::Data { description, .. } = &mut self.kind {
            *description = Some(text.into());
        }
        self
    }

    /// Default value; makes the argument optional.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        if let ParamKind::Data { default, .. } = &mut self.kind {
            *default = Some(value);
        }
        self
    }

    /// Argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this argument is the execution-context handle.
    #[must_use]
    pub fn is_context(&self) -> bool {
        matches!(self.kind, ParamKind::Context)
    }
}

/// Argument list, return type, and doc comment of a signature-path callable.
#[derive(Clone, Debug, PartialEq)]
pub struct CallableSignature {
    name: String,
    doc: Option<String>,
    params: Vec<ParamSpec>,
    returns: FieldType,
    returns_nullable: bool,
}

impl CallableSignature {
    /// Starts a signature for the named function. The return type defaults to
    /// [`FieldType::Any`].
    #[must_use]
    pub fn new(name: impl Into<String>, doc: Option<&str>) -> Self {
        Self {
            name: name.into(),
            doc: doc.map(str::to_owned),
            params: Vec::new(),
            returns: FieldType::Any,
            returns_nullable: false,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, field_type: FieldType, nullable: bool) -> Self {
        self.returns = field_type;
        self.returns_nullable = nullable;
        self
    }

    /// Sets the return type from a Rust type.
    #[must_use]
    pub fn returns_of<T: SchemaType>(self) -> Self {
        self.returns(T::field_type(), T::is_optional())
    }

    /// Declared arguments in order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

#[derive(Clone)]
enum CallableKind {
    Simple {
        request: FieldType,
        response: FieldType,
        entry: EntryPoint,
    },
    Signature {
        signature: CallableSignature,
        body: Body,
    },
}

/// A function body together with the description needed to compile it.
#[derive(Clone)]
pub struct Callable {
    name: String,
    doc: Option<String>,
    kind: CallableKind,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &self.kind {
            CallableKind::Simple { .. } => "simple",
            CallableKind::Signature { .. } => "signature",
        };
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("shape", &shape)
            .finish_non_exhaustive()
    }
}

impl Callable {
    /// Simple-path callable: `request` and `response` must be record types.
    pub fn simple<F>(
        name: impl Into<String>,
        doc: Option<&str>,
        request: FieldType,
        response: FieldType,
        entry: F,
    ) -> Self
    where
        F: Fn(Value, &Metadata) -> ToolResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: doc.map(str::to_owned),
            kind: CallableKind::Simple {
                request,
                response,
                entry: Arc::new(entry),
            },
        }
    }

    /// Signature-path callable. `body` receives the decoded arguments and
    /// returns the raw return value.
    pub fn signature<F>(signature: CallableSignature, body: F) -> Self
    where
        F: Fn(Arguments) -> ToolResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: signature.name.clone(),
            doc: signature.doc.clone(),
            kind: CallableKind::Signature {
                signature,
                body: Arc::new(body),
            },
        }
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validated arguments handed to a signature-path body.
#[derive(Debug)]
pub struct Arguments {
    action: String,
    values: Map<String, Value>,
    shell: Option<Arc<dyn Shell>>,
}

impl Arguments {
    /// Wraps validated request values.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        values: Map<String, Value>,
        shell: Option<Arc<dyn Shell>>,
    ) -> Self {
        Self {
            action: action.into(),
            values,
            shell,
        }
    }

    /// Name of the action being invoked.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Removes and decodes one argument. Absent arguments decode from `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgument`] when the value does not decode
    /// into `T`.
    pub fn take<T: DeserializeOwned>(&mut self, name: &str) -> ToolResult<T> {
        let value = self.values.remove(name).unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|err| ToolError::InvalidArgument {
            action: self.action.clone(),
            argument: name.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Shell resolved from `workspace.shells.recent`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::WorkspaceNotInitialized`] when the callable did
    /// not declare a context argument.
    pub fn shell(&self) -> ToolResult<Arc<dyn Shell>> {
        self.shell
            .clone()
            .ok_or_else(|| ToolError::WorkspaceNotInitialized {
                action: self.action.clone(),
                detail: "no shell was resolved for this invocation",
            })
    }

    /// Converts a body failure into an execution error.
    #[must_use]
    pub fn failure<E: fmt::Display>(&self, err: E) -> ToolError {
        ToolError::execution(self.action.clone(), err.to_string())
    }

    /// Encodes a return value.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] when serialization fails.
    pub fn output<T: Serialize>(&self, value: &T) -> ToolResult<Value> {
        encode_response(&self.action, value)
    }
}

/// Decodes a validated request payload into a record type.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgument`] when the payload does not decode.
pub fn decode_request<T: DeserializeOwned>(action: &str, request: Value) -> ToolResult<T> {
    serde_json::from_value(request).map_err(|err| ToolError::InvalidArgument {
        action: action.to_owned(),
        argument: "request_data".into(),
        reason: err.to_string(),
    })
}

/// Encodes a response record.
///
/// # Errors
///
/// Returns [`ToolError::Execution`] when serialization fails.
pub fn encode_response<T: Serialize>(action: &str, value: &T) -> ToolResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| ToolError::execution(action, format!("response could not be encoded: {err}")))
}

/// Output of [`compile`].
#[derive(Clone)]
pub struct CompiledCallable {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) entry: EntryPoint,
    pub(crate) request: Arc<TypedModel>,
    pub(crate) response: Arc<TypedModel>,
    pub(crate) runs_on_shell: bool,
    pub(crate) derived_models: Vec<String>,
}

impl fmt::Debug for CompiledCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCallable")
            .field("name", &self.name)
            .field("request", &self.request.name())
            .field("response", &self.response.name())
            .field("runs_on_shell", &self.runs_on_shell)
            .finish_non_exhaustive()
    }
}

impl CompiledCallable {
    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description taken from the doc comment header.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Request model.
    #[must_use]
    pub fn request_model(&self) -> &Arc<TypedModel> {
        &self.request
    }

    /// Response model.
    #[must_use]
    pub fn response_model(&self) -> &Arc<TypedModel> {
        &self.response
    }

    /// Whether the action needs a workspace shell.
    #[must_use]
    pub fn runs_on_shell(&self) -> bool {
        self.runs_on_shell
    }

    /// Model names minted by the compiler rather than declared by the author.
    #[must_use]
    pub fn derived_models(&self) -> &[String] {
        &self.derived_models
    }

    /// Invokes the entry point without validation.
    ///
    /// # Errors
    ///
    /// Propagates errors from the body.
    pub fn invoke(&self, request: Value, metadata: &Metadata) -> ToolResult<Value> {
        (self.entry)(request, metadata)
    }
}

/// Compiles a callable into models and an entry point.
///
/// `runs_on_shell` is forced on when the callable declares a context argument.
///
/// # Errors
///
/// * [`ToolError::InvalidSignature`] when a simple-path annotation is not a
///   record or a signature-path callable has no doc comment description.
/// * [`ToolError::InvalidContextArgument`] when more than one argument is a
///   context handle.
/// * Schema errors from building the derived models, scoped to the callable.
pub fn compile(callable: Callable, runs_on_shell: bool) -> ToolResult<CompiledCallable> {
    let Callable { name, doc, kind } = callable;
    let compiled = match kind {
        CallableKind::Simple {
            request,
            response,
            entry,
        } => {
            let request = expect_record(&name, "request", request)?;
            let response = expect_record(&name, "response", response)?;
            let description = doc
                .as_deref()
                .and_then(Docstring::parse)
                .map(|doc| doc.header)
                .unwrap_or_default();

            CompiledCallable {
                name,
                description,
                entry,
                request,
                response,
                runs_on_shell,
                derived_models: Vec::new(),
            }
        }
        CallableKind::Signature { signature, body } => {
            compile_signature(name, doc.as_deref(), &signature, body, runs_on_shell)
                .map_err(|err| err.within(&signature.name))?
        }
    };

    debug!(
        action = %compiled.name,
        request = compiled.request.name(),
        response = compiled.response.name(),
        runs_on_shell = compiled.runs_on_shell,
        "compiled callable"
    );
    Ok(compiled)
}

fn expect_record(action: &str, role: &str, field_type: FieldType) -> ToolResult<Arc<TypedModel>> {
    match field_type {
        FieldType::Object(model) => Ok(model),
        other => Err(ToolError::InvalidSignature {
            action: action.to_owned(),
            reason: format!(
                "{role} type must be a validated record, found {}",
                other.json_type().unwrap_or("any")
            ),
        }),
    }
}

fn compile_signature(
    name: String,
    doc: Option<&str>,
    signature: &CallableSignature,
    body: Body,
    runs_on_shell: bool,
) -> ToolResult<CompiledCallable> {
    let doc = doc
        .and_then(Docstring::parse)
        .ok_or_else(|| ToolError::InvalidSignature {
            action: name.clone(),
            reason: "a doc comment starting with a description line is required".into(),
        })?;

    let contexts: Vec<&ParamSpec> = signature.params.iter().filter(|p| p.is_context()).collect();
    if contexts.len() > 1 {
        return Err(ToolError::InvalidContextArgument {
            action: name,
            arguments: contexts.iter().map(|p| p.name.clone()).collect(),
        });
    }
    let has_context = !contexts.is_empty();

    let camel = camelize(&name);
    let request_name = format!("{camel}Request");
    let mut request = TypedModel::builder(&request_name).description(doc.header.clone());
    for param in &signature.params {
        let ParamKind::Data {
            field_type,
            nullable,
            description,
            default,
        } = &param.kind
        else {
            continue;
        };

        let description = description
            .clone()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| doc.param(&param.name).map(str::to_owned))
            .unwrap_or_else(|| titleize(&param.name));

        let field = match (default, nullable) {
            (Some(value), _) => {
                FieldDescriptor::optional(&param.name, field_type.clone(), value.clone(), description)
            }
            (None, true) => {
                FieldDescriptor::optional(&param.name, field_type.clone(), Value::Null, description)
            }
            (None, false) => FieldDescriptor::required(&param.name, field_type.clone(), description),
        };
        request = request.field(
            field
                .with_title(titleize(&param.name))
                .with_nullable(*nullable),
        );
    }
    let request = Arc::new(request.build()?);
    let mut derived_models = vec![request_name];

    let (response, wrap_field) = match &signature.returns {
        FieldType::Object(model) if !signature.returns_nullable => (Arc::clone(model), None),
        returns => {
            let field_name = doc
                .returns
                .as_ref()
                .and_then(|r| r.name.clone())
                .unwrap_or_else(|| "return".to_owned());
            let description = doc
                .returns
                .as_ref()
                .map(|r| r.description.clone())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| titleize(&field_name));

            let field = if signature.returns_nullable {
                FieldDescriptor::optional(&field_name, returns.clone(), Value::Null, description)
                    .with_nullable(true)
            } else {
                FieldDescriptor::required(&field_name, returns.clone(), description)
            };
            let response_name = format!("{camel}Response");
            let model = TypedModel::builder(&response_name).field(field).build()?;
            derived_models.push(response_name);
            (Arc::new(model), Some(field_name))
        }
    };

    let action = name.clone();
    let entry: EntryPoint = Arc::new(move |request: Value, metadata: &Metadata| {
        let values = match request {
            Value::Object(values) => values,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidArgument {
                    action: action.clone(),
                    argument: "$".into(),
                    reason: format!("expected an object of arguments, found `{other}`"),
                });
            }
        };

        let shell = if has_context {
            Some(metadata.recent_shell(&action)?)
        } else {
            None
        };

        let output = body(Arguments::new(action.clone(), values, shell))?;
        Ok(match &wrap_field {
            Some(field) => {
                let mut response = Map::new();
                response.insert(field.clone(), output);
                Value::Object(response)
            }
            None => output,
        })
    });

    Ok(CompiledCallable {
        name,
        description: doc.header,
        entry,
        request,
        response,
        runs_on_shell: runs_on_shell || has_context,
        derived_models,
    })
}
