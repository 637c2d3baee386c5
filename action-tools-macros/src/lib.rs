//! Procedural macros for declaring actions.
//!
//! `#[action]` reads a plain function's parameters, their types, and its `///`
//! doc comment, and emits a `{name}_action()` constructor returning an
//! `ActionDeclaration`. The declaration is also submitted to the link-time
//! collection consumed by `Registry::load_declared`.

use proc_macro::TokenStream;
use proc_macro2::{TokenStream as TokenStream2, TokenTree};
use quote::{ToTokens, format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, ExprLit, FnArg, GenericArgument, ItemFn, Lit, LitStr, Meta, Pat, Path,
    PathArguments, ReturnType, Token, Type, parenthesized, parse_macro_input,
};

/// Declares a function as an action of a tool.
///
/// ```ignore
/// /// Move the view to a line.
/// /// :param line_number: target line
/// /// :return output: command output
/// #[action(tool = "cmdmanager", tags("navigation"), requires("vim"))]
/// fn goto(shell: &dyn Shell, line_number: i64) -> Result<String, io::Error> { ... }
/// ```
///
/// Attribute keys:
///
/// * `tool = "..."` (required): owning tool.
/// * `tags("a", "b")`: tag labels.
/// * `requires("git")`: external programs the action depends on.
/// * `runs_on_shell`: mark as shell-bound even without a context argument.
/// * `crate = "path"`: path to `action_tools` when it is re-exported.
///
/// Parameters annotated with `#[context]`, or whose type names `Shell`, receive
/// the most recent workspace shell. `#[arg(description = "...", default = expr)]`
/// documents a parameter and gives it a default. A function taking exactly
/// `request_data` and `metadata` is treated as already typed by request and
/// response records.
#[proc_macro_attribute]
pub fn action(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ActionArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(&meta));
    parse_macro_input!(attr with parser);
    let function = parse_macro_input!(item as ItemFn);

    match expand(args, function) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ActionArgs {
    tool: Option<LitStr>,
    tags: Vec<LitStr>,
    requires: Option<Vec<LitStr>>,
    runs_on_shell: bool,
    krate: Option<Path>,
}

impl ActionArgs {
    fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("tool") {
            self.tool = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("tags") {
            self.tags.extend(string_list(meta)?);
        } else if meta.path.is_ident("requires") {
            self.requires = Some(string_list(meta)?);
        } else if meta.path.is_ident("runs_on_shell") {
            self.runs_on_shell = true;
        } else if meta.path.is_ident("crate") {
            let path: LitStr = meta.value()?.parse()?;
            self.krate = Some(path.parse()?);
        } else {
            return Err(meta.error(
                "unsupported action attribute; expected `tool`, `tags`, `requires`, `runs_on_shell`, or `crate`",
            ));
        }
        Ok(())
    }
}

fn string_list(meta: &ParseNestedMeta<'_>) -> syn::Result<Vec<LitStr>> {
    let content;
    parenthesized!(content in meta.input);
    let list = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
    Ok(list.into_iter().collect())
}

enum ParamRole {
    Data {
        ty: Type,
        description: Option<LitStr>,
        default: Option<Expr>,
    },
    Context {
        by_ref: bool,
    },
}

struct Param {
    name: String,
    role: ParamRole,
}

enum ReturnShape {
    Plain(Type),
    ToolResult(Type),
    Result(Type),
}

impl ReturnShape {
    fn value_type(&self) -> &Type {
        match self {
            Self::Plain(ty) | Self::ToolResult(ty) | Self::Result(ty) => ty,
        }
    }

    fn finish(&self, call: &TokenStream2, krate: &Path, action: &str) -> TokenStream2 {
        match self {
            Self::Plain(_) => call.clone(),
            Self::ToolResult(_) => quote!(#call?),
            Self::Result(_) => quote! {
                #call.map_err(|err| #krate::ToolError::execution(#action, err.to_string()))?
            },
        }
    }
}

fn expand(args: ActionArgs, mut function: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &function.sig;
    let Some(tool) = args.tool.clone() else {
        return Err(syn::Error::new(
            sig.ident.span(),
            "missing `tool = \"...\"` in #[action(...)]",
        ));
    };
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "actions must be synchronous functions"));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(&sig.generics, "actions cannot be generic"));
    }
    let ReturnType::Type(_, output) = &sig.output else {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "actions must declare a return type",
        ));
    };
    let returns = return_shape(output);

    let krate = args
        .krate
        .clone()
        .unwrap_or_else(|| syn::parse_quote!(::action_tools));
    let fn_ident = function.sig.ident.clone();
    let action = fn_ident.to_string().trim_start_matches("r#").to_owned();
    let doc = doc_comment(&function.attrs);
    let doc_tokens = match &doc {
        Some(text) => quote!(::core::option::Option::Some(#text)),
        None => quote!(::core::option::Option::None),
    };

    let params = collect_params(&mut function)?;

    let callable = if is_simple(&params) {
        simple_callable(&params, &returns, &krate, &fn_ident, &action, &doc_tokens)
    } else {
        signature_callable(&params, &returns, &krate, &fn_ident, &action, &doc_tokens)?
    };

    let vis = &function.vis;
    let decl_ident = format_ident!("{}_action", action);
    let decl_doc = format!("Declaration of the `{action}` action.");

    let tags = &args.tags;
    let tags = (!tags.is_empty()).then(|| quote!(.with_tags([#(#tags),*])));
    let requires = args.requires.as_ref().map(|list| {
        if list.is_empty() {
            quote!(.with_requires(::std::vec::Vec::<::std::string::String>::new()))
        } else {
            quote!(.with_requires([#(#list),*]))
        }
    });
    let runs_on_shell = args.runs_on_shell;

    Ok(quote! {
        #function

        #[doc = #decl_doc]
        #vis fn #decl_ident() -> #krate::ActionDeclaration {
            #krate::ActionDeclaration::new(#tool, #callable)
                #tags
                #requires
                .with_runs_on_shell(#runs_on_shell)
        }

        #krate::__private::inventory::submit! {
            #krate::DeclaredAction::new(#decl_ident)
        }
    })
}

fn collect_params(function: &mut ItemFn) -> syn::Result<Vec<Param>> {
    let mut params = Vec::new();
    for input in &mut function.sig.inputs {
        let pat_type = match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "actions are free functions and cannot take `self`",
                ));
            }
            FnArg::Typed(pat_type) => pat_type,
        };

        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "action parameters must be plain identifiers",
            ));
        };
        let name = pat_ident.ident.to_string();

        let mut context = false;
        let mut description = None;
        let mut default = None;
        let mut kept = Vec::with_capacity(pat_type.attrs.len());
        for attr in pat_type.attrs.drain(..) {
            if attr.path().is_ident("context") {
                context = true;
            } else if attr.path().is_ident("arg") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("description") {
                        description = Some(meta.value()?.parse::<LitStr>()?);
                        Ok(())
                    } else if meta.path.is_ident("default") {
                        default = Some(meta.value()?.parse::<Expr>()?);
                        Ok(())
                    } else {
                        Err(meta.error("expected `description` or `default`"))
                    }
                })?;
            } else {
                kept.push(attr);
            }
        }
        pat_type.attrs = kept;

        let ty = pat_type.ty.as_ref();
        let role = if context || mentions_shell(ty.to_token_stream()) {
            ParamRole::Context {
                by_ref: matches!(ty, Type::Reference(_)),
            }
        } else if name == "metadata" {
            ParamRole::Data {
                ty: ty.clone(),
                description,
                default,
            }
        } else {
            if let Type::Reference(reference) = ty {
                return Err(syn::Error::new_spanned(
                    reference,
                    "action arguments are decoded from the request and must be owned types",
                ));
            }
            ParamRole::Data {
                ty: ty.clone(),
                description,
                default,
            }
        };
        params.push(Param { name, role });
    }
    Ok(params)
}

fn is_simple(params: &[Param]) -> bool {
    matches!(params, [first, second]
        if first.name == "request_data"
            && second.name == "metadata"
            && matches!(first.role, ParamRole::Data { .. }))
}

fn simple_callable(
    params: &[Param],
    returns: &ReturnShape,
    krate: &Path,
    fn_ident: &syn::Ident,
    action: &str,
    doc: &TokenStream2,
) -> TokenStream2 {
    let ParamRole::Data { ty: request_ty, .. } = &params[0].role else {
        unreachable!("simple callables start with a data parameter");
    };
    let response_ty = returns.value_type();
    let call = quote!(#fn_ident(__request, __metadata));
    let call = returns.finish(&call, krate, action);

    quote! {
        #krate::Callable::simple(
            #action,
            #doc,
            <#request_ty as #krate::SchemaType>::field_type(),
            <#response_ty as #krate::SchemaType>::field_type(),
            |__request: #krate::__private::serde_json::Value, __metadata: &#krate::Metadata| {
                let __request: #request_ty = #krate::decode_request(#action, __request)?;
                let __response = #call;
                #krate::encode_response(#action, &__response)
            },
        )
    }
}

fn signature_callable(
    params: &[Param],
    returns: &ReturnShape,
    krate: &Path,
    fn_ident: &syn::Ident,
    action: &str,
    doc: &TokenStream2,
) -> syn::Result<TokenStream2> {
    let mut specs = Vec::with_capacity(params.len());
    let mut bindings = Vec::with_capacity(params.len());
    let mut call_args = Vec::with_capacity(params.len());

    for (idx, param) in params.iter().enumerate() {
        let name = &param.name;
        let local = format_ident!("__arg{}", idx);
        match &param.role {
            ParamRole::Context { by_ref } => {
                specs.push(quote!(.param(#krate::ParamSpec::context(#name))));
                bindings.push(quote!(let #local = __args.shell()?;));
                call_args.push(if *by_ref { quote!(&*#local) } else { quote!(#local) });
            }
            ParamRole::Data {
                ty,
                description,
                default,
            } => {
                if let Type::Reference(reference) = ty {
                    return Err(syn::Error::new_spanned(
                        reference,
                        "action arguments are decoded from the request and must be owned types",
                    ));
                }
                let description = description
                    .as_ref()
                    .map(|text| quote!(.with_description(#text)));
                let default = default.as_ref().map(
                    |expr| quote!(.with_default(#krate::__private::serde_json::json!(#expr))),
                );
                specs.push(quote!(.param(#krate::ParamSpec::of::<#ty>(#name) #description #default)));
                bindings.push(quote!(let #local: #ty = __args.take(#name)?;));
                call_args.push(quote!(#local));
            }
        }
    }

    let return_ty = returns.value_type();
    let call = quote!(#fn_ident(#(#call_args),*));
    let call = returns.finish(&call, krate, action);

    Ok(quote! {
        #krate::Callable::signature(
            #krate::CallableSignature::new(#action, #doc)
                #(#specs)*
                .returns_of::<#return_ty>(),
            |__args: #krate::Arguments| {
                #[allow(unused_mut)]
                let mut __args = __args;
                #(#bindings)*
                let __output = #call;
                __args.output(&__output)
            },
        )
    })
}

fn return_shape(ty: &Type) -> ReturnShape {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            let wrapper = segment.ident.to_string();
            if let PathArguments::AngleBracketed(generics) = &segment.arguments {
                if let Some(GenericArgument::Type(inner)) = generics.args.first() {
                    match wrapper.as_str() {
                        "ToolResult" => return ReturnShape::ToolResult(inner.clone()),
                        "Result" => return ReturnShape::Result(inner.clone()),
                        _ => {}
                    }
                }
            }
        }
    }
    ReturnShape::Plain(ty.clone())
}

fn mentions_shell(tokens: TokenStream2) -> bool {
    tokens.into_iter().any(|tree| match tree {
        TokenTree::Ident(ident) => ident == "Shell",
        TokenTree::Group(group) => mentions_shell(group.stream()),
        _ => false,
    })
}

fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_owned).unwrap_or(line))
        .collect();

    let joined = lines.join("\n");
    (!joined.trim().is_empty()).then_some(joined)
}
