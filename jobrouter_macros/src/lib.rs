use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    ext::IdentExt, parse_macro_input, FnArg, GenericArgument, Ident, ItemFn, LitStr, Pat,
    PathArguments, ReturnType, Type, TypeParamBound,
};

/// Parameter names bound from request context handles instead of JSON args.
const HANDLE_PARAMS: [&str; 2] = ["binary_stream", "websocket"];

// ============================================================================
// #[job] attribute macro
// ============================================================================

/// Attribute macro that declares a free function as a routable job.
///
/// The function is emitted unchanged. Next to it the macro generates a
/// module of the same name with a `declaration()` function returning a
/// `jobrouter::JobDeclaration`, which `jobrouter::jobs!` collects.
///
/// # Usage
///
/// Single-result job (an `async fn`):
/// ```ignore
/// #[job(name = "addition", description = "Add two numbers together")]
/// async fn addition(num1: i64, num2: i64) -> i64 {
///     num1 + num2
/// }
/// ```
///
/// A plain `fn` returning `impl Future<Output = T>` or `BoxFuture<'_, T>`
/// is a single-result job as well; the returned future is awaited.
///
/// Streaming job (returns `impl Stream` or a `BoxStream`):
/// ```ignore
/// #[job]
/// fn count_up(limit: u64) -> impl Stream<Item = u64> + Send {
///     futures::stream::iter(0..=limit)
/// }
/// ```
///
/// Receiving a context handle:
/// ```ignore
/// #[job]
/// async fn upload(label: String, binary_stream: ContextHandle) -> Result<usize, UploadError> {
///     // ...
/// }
/// ```
///
/// The macro supports:
/// - `name = "..."`: routing name (defaults to the function name)
/// - `description = "..."`: free-text description
/// - `result`: treat the output (or stream item) as a `Result` even when its
///   type is spelled through an alias
///
/// Any other function is a synchronous job. Its declaration is still
/// generated so registration can reject it with `InvalidHandlerKind`.
///
/// Parameters are deserialized from the request's JSON arguments, except
/// `binary_stream` and `websocket`, which take a `ContextHandle` or
/// `Option<ContextHandle>`. A `Result<T, E>` output (or stream item) turns
/// `Err(E)` into a handler failure. `Result` is recognized by the last path
/// segment of the written type only; a type alias such as
/// `type Outcome = Result<i64, String>` needs `#[job(result)]`, otherwise
/// the `Err` value is serialized as a successful result. The function must
/// live at module level and cannot be generic or take `self`.
#[proc_macro_attribute]
pub fn job(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = JobArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("description") {
            args.description = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("result") {
            args.result = true;
            Ok(())
        } else {
            Err(meta.error(
                "unsupported job argument, expected `name`, `description` or `result`",
            ))
        }
    });
    parse_macro_input!(attr with parser);
    let func = parse_macro_input!(item as ItemFn);

    match expand_job(&args, &func) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

#[derive(Default)]
struct JobArgs {
    name: Option<LitStr>,
    description: Option<LitStr>,
    result: bool,
}

enum JobKind {
    /// Awaited call; carries the resolved output type, `None` for `()`.
    SingleResult(Option<Type>),
    Streaming(Type),
    Blocking,
}

struct JobParam {
    ident: Ident,
    ty: Type,
    name: String,
    is_handle: bool,
}

fn expand_job(args: &JobArgs, func: &ItemFn) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[job] functions cannot be generic",
        ));
    }

    let params = job_params(func)?;
    let ident = &sig.ident;
    let vis = &func.vis;
    let ident_str = ident.unraw().to_string();

    let param_idents: Vec<_> = params.iter().map(|p| &p.ident).collect();
    let param_types: Vec<_> = params.iter().map(|p| &p.ty).collect();
    let param_names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
    let takers: Vec<_> = params
        .iter()
        .map(|p| {
            let ty = &p.ty;
            let name = &p.name;
            if p.is_handle {
                quote! { __args.take_handle::<#ty>(#name)? }
            } else {
                quote! { __args.take::<#ty>(#name)? }
            }
        })
        .collect();

    let call = quote! { super::#ident(#(#param_idents),*) };
    let fallible = |ty: Option<&Type>| args.result || ty.is_some_and(is_result);

    let handler = match job_kind(func) {
        JobKind::SingleResult(output) => {
            let unwrap_out = unwrap_result(fallible(output.as_ref()));
            quote! {
                ::jobrouter::HandlerFn::single(|mut __args: ::jobrouter::CallArgs| {
                    let __bound = __bind(&mut __args);
                    async move {
                        let (#(#param_idents,)*) = match __bound {
                            ::core::result::Result::Ok(bound) => bound,
                            ::core::result::Result::Err(e) => {
                                return ::core::result::Result::Err(::jobrouter::BoxError::from(e));
                            }
                        };
                        let __out = #call.await;
                        #unwrap_out
                        ::jobrouter::__private::serde_json::to_value(__out)
                            .map_err(::jobrouter::BoxError::from)
                    }
                })
            }
        }
        JobKind::Streaming(item) => {
            let map_item = if fallible(Some(&item)) {
                quote! {
                    match __item {
                        ::core::result::Result::Ok(value) => {
                            ::jobrouter::__private::serde_json::to_value(value)
                                .map_err(::jobrouter::BoxError::from)
                        }
                        ::core::result::Result::Err(e) => ::core::result::Result::Err(
                            ::core::convert::Into::<::jobrouter::BoxError>::into(e),
                        ),
                    }
                }
            } else {
                quote! {
                    ::jobrouter::__private::serde_json::to_value(__item)
                        .map_err(::jobrouter::BoxError::from)
                }
            };
            quote! {
                ::jobrouter::HandlerFn::streaming(|mut __args: ::jobrouter::CallArgs| {
                    let (#(#param_idents,)*) = __bind(&mut __args)?;
                    let __stream = #call;
                    ::core::result::Result::Ok(::jobrouter::__private::futures::StreamExt::map(
                        __stream,
                        |__item| #map_item,
                    ))
                })
            }
        }
        JobKind::Blocking => {
            let output = match &sig.output {
                ReturnType::Type(_, ty) => Some(&**ty),
                ReturnType::Default => None,
            };
            let unwrap_out = unwrap_result(fallible(output));
            quote! {
                ::jobrouter::HandlerFn::blocking(|mut __args: ::jobrouter::CallArgs| {
                    let (#(#param_idents,)*) = __bind(&mut __args)?;
                    let __out = #call;
                    #unwrap_out
                    ::jobrouter::__private::serde_json::to_value(__out)
                        .map_err(::jobrouter::BoxError::from)
                })
            }
        }
    };

    let name_call = args.name.as_ref().map(|name| quote! { .name(#name) });
    let description_call = args
        .description
        .as_ref()
        .map(|description| quote! { .description(#description) });
    let module_doc = format!("`#[job]` declaration for `{}`.", ident_str);

    Ok(quote! {
        #func

        #[doc = #module_doc]
        #vis mod #ident {
            #[allow(unused_imports)]
            use super::*;

            /// Declaration to register with a `JobCatalog` or `JobRegistry`.
            pub fn declaration() -> ::jobrouter::JobDeclaration {
                #[allow(unused_variables, unused_mut)]
                fn __bind(
                    __args: &mut ::jobrouter::CallArgs,
                ) -> ::core::result::Result<(#(#param_types,)*), ::jobrouter::ArgumentError> {
                    ::core::result::Result::Ok((#(#takers,)*))
                }

                ::jobrouter::JobDeclaration::new(#ident_str, #handler)
                    #name_call
                    #description_call
                    .parameters::<_, &'static str>([#(#param_names),*])
            }
        }
    })
}

/// Early-return a handler failure from a `Result` output held in `__out`.
fn unwrap_result(output_is_result: bool) -> TokenStream2 {
    if output_is_result {
        quote! {
            let __out = match __out {
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(e) => {
                    return ::core::result::Result::Err(
                        ::core::convert::Into::<::jobrouter::BoxError>::into(e),
                    );
                }
            };
        }
    } else {
        quote! {}
    }
}

fn job_params(func: &ItemFn) -> syn::Result<Vec<JobParam>> {
    func.sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(
                receiver,
                "#[job] cannot be applied to methods",
            )),
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) if pat_ident.by_ref.is_none() && pat_ident.subpat.is_none() => {
                    let name = pat_ident.ident.unraw().to_string();
                    Ok(JobParam {
                        ident: pat_ident.ident.clone(),
                        ty: (*pat_type.ty).clone(),
                        is_handle: HANDLE_PARAMS.contains(&name.as_str()),
                        name,
                    })
                }
                other => Err(syn::Error::new_spanned(
                    other,
                    "job parameters must be plain identifiers",
                )),
            },
        })
        .collect()
}

fn job_kind(func: &ItemFn) -> JobKind {
    let output = match &func.sig.output {
        ReturnType::Type(_, ty) => Some(&**ty),
        ReturnType::Default => None,
    };
    if func.sig.asyncness.is_some() {
        return JobKind::SingleResult(output.cloned());
    }
    let Some(ty) = output else {
        return JobKind::Blocking;
    };
    if let Some(awaited) = future_output(ty) {
        JobKind::SingleResult(Some(awaited))
    } else if let Some(item) = stream_item(ty) {
        JobKind::Streaming(item)
    } else {
        JobKind::Blocking
    }
}

/// Item type of `impl Stream<Item = T>` or `BoxStream<'_, T>`.
fn stream_item(ty: &Type) -> Option<Type> {
    trait_assoc(ty, "Stream", "Item", "BoxStream")
}

/// Output type of `impl Future<Output = T>` or `BoxFuture<'_, T>`.
fn future_output(ty: &Type) -> Option<Type> {
    trait_assoc(ty, "Future", "Output", "BoxFuture")
}

/// `T` from `impl Trait<Assoc = T>` or from the boxed alias `Boxed<'_, T>`.
fn trait_assoc(ty: &Type, trait_name: &str, assoc_name: &str, boxed: &str) -> Option<Type> {
    match ty {
        Type::ImplTrait(impl_trait) => impl_trait.bounds.iter().find_map(|bound| {
            let TypeParamBound::Trait(trait_bound) = bound else {
                return None;
            };
            let segment = trait_bound.path.segments.last()?;
            if segment.ident != trait_name {
                return None;
            }
            let PathArguments::AngleBracketed(generics) = &segment.arguments else {
                return None;
            };
            generics.args.iter().find_map(|arg| match arg {
                GenericArgument::AssocType(assoc) if assoc.ident == assoc_name => {
                    Some(assoc.ty.clone())
                }
                _ => None,
            })
        }),
        Type::Path(type_path) => {
            let segment = type_path.path.segments.last()?;
            if segment.ident != boxed {
                return None;
            }
            let PathArguments::AngleBracketed(generics) = &segment.arguments else {
                return None;
            };
            generics.args.iter().find_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty.clone()),
                _ => None,
            })
        }
        Type::Paren(paren) => trait_assoc(&paren.elem, trait_name, assoc_name, boxed),
        Type::Group(group) => trait_assoc(&group.elem, trait_name, assoc_name, boxed),
        _ => None,
    }
}

fn is_result(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        Type::Paren(paren) => is_result(&paren.elem),
        Type::Group(group) => is_result(&group.elem),
        _ => false,
    }
}
