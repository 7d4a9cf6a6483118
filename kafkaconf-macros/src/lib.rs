// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, spanned::Spanned, Attribute, Data, DeriveInput,
    Fields, LitStr, Token, Type,
};

/// Options parsed from the `#[config_keys(...)]` field attribute
#[derive(Default)]
struct FieldOptions {
    name: Option<String>,
    leaf: bool,
    skip: bool,
}

/// Parses the `#[config_keys(...)]` attributes of a field
///
/// Accepted forms: `#[config_keys(name = "segment")]`, `#[config_keys(leaf)]`
/// and `#[config_keys(skip)]`, which can be combined in a single attribute.
fn get_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("config_keys")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                options.name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("leaf") {
                options.leaf = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `name`, `leaf` or `skip`"))
            }
        })?;
    }

    Ok(options)
}

/// Finds the name given to a field by `#[serde(rename = "...")]`
///
/// The decoder uses that name to look the field up, so the key segment has to
/// follow it. For the `rename(serialize = "..", deserialize = "..")` form the
/// deserialize name is used. Every other serde option is skipped.
fn get_serde_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        let value: LitStr = inner.value()?.parse()?;
                        if inner.path.is_ident("deserialize") {
                            rename = Some(value.value());
                        }
                        Ok(())
                    })?;
                }
            } else if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                let _: proc_macro2::TokenStream = content.parse()?;
            }
            Ok(())
        })?;
    }

    Ok(rename)
}

/// Checks if a type is a scalar value that terminates the key walk.
fn is_leaf_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => {
            type_path.path.segments.last().is_some_and(|segment| {
                matches!(
                    segment.ident.to_string().as_str(),
                    "bool"
                        | "char"
                        | "f32"
                        | "f64"
                        | "i8"
                        | "i16"
                        | "i32"
                        | "i64"
                        | "i128"
                        | "isize"
                        | "u8"
                        | "u16"
                        | "u32"
                        | "u64"
                        | "u128"
                        | "usize"
                        | "String"
                        | "PathBuf"
                        | "Duration"
                        | "Option"
                        | "Vec"
                )
            })
        }
        Type::Array(_)
        | Type::Reference(_)
        | Type::Slice(_)
        | Type::Tuple(_) => true,
        _ => false,
    }
}

#[proc_macro_derive(ConfigKeys, attributes(config_keys))]
/// Derives `kafkaconf::config::ConfigKeys` for a struct with named fields.
///
/// The generated `key_paths()` returns the dotted path of every leaf field,
/// recursing into nested configuration structs.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(ConfigKeys, Deserialize)]
/// struct NetConfig {
///     dial_timeout: Duration,          // "dial_timeout"
///     tls: NetTlsConfig,               // "tls.enable", ...
///     #[serde(rename = "return")]
///     returns: ReturnConfig,           // "return.errors", ...
///     #[config_keys(leaf)]
///     mechanism: SaslMechanism,        // "mechanism"
///     #[config_keys(skip)]
///     context: Option<Arc<TlsContext>>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[config_keys(name = "segment")]`: use `segment` as the key segment.
/// - `#[serde(rename = "segment")]`: honoured when no `name` is given.
/// - `#[config_keys(leaf)]`: treat a non-scalar type as a single value.
/// - `#[config_keys(skip)]`: leave the field out of the key table.
///
/// Without annotations the segment is the field name in lower case. Integers,
/// floats, `bool`, `char`, `String`, `PathBuf`, `Duration`, `Option<T>` and
/// `Vec<T>` are leaves; every other type must implement `ConfigKeys` itself.
pub fn derive_config_keys(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let type_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();

    let named_fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return syn::Error::new(
                    input.span(),
                    "ConfigKeys only supports structs with named fields.",
                )
                .into_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                input.span(),
                "ConfigKeys can only be derived for structs.",
            )
            .into_compile_error()
            .into();
        }
    };

    let mut pushes = Vec::new();

    for f in named_fields.iter() {
        let options = match get_field_options(&f.attrs) {
            Ok(options) => options,
            Err(e) => return e.into_compile_error().into(),
        };
        if options.skip {
            continue;
        }

        let rename = match get_serde_rename(&f.attrs) {
            Ok(rename) => rename,
            Err(e) => return e.into_compile_error().into(),
        };

        let segment = match (options.name, rename, f.ident.as_ref()) {
            (Some(name), _, _) => name,
            (None, Some(rename), _) => rename,
            (None, None, Some(ident)) => {
                let name = ident.to_string();
                name.strip_prefix("r#").unwrap_or(&name).to_lowercase()
            }
            (None, None, None) => continue,
        };

        let ty = &f.ty;
        if options.leaf || is_leaf_type(ty) {
            pushes.push(quote! {
                paths.push(::std::string::String::from(#segment));
            });
        } else {
            pushes.push(quote! {
                paths.extend(
                    <#ty as ::kafkaconf::config::ConfigKeys>::key_paths()
                        .into_iter()
                        .map(|path| ::std::format!("{}.{}", #segment, path)),
                );
            });
        }
    }

    let expanded = quote! {
        impl #impl_generics ::kafkaconf::config::ConfigKeys for #type_name #ty_generics #where_clause {
            fn key_paths() -> ::std::vec::Vec<::std::string::String> {
                let mut paths = ::std::vec::Vec::new();
                #(#pushes)*
                paths
            }
        }
    };

    TokenStream::from(expanded)
}
