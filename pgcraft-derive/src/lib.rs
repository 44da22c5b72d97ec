//! `#[derive(Row)]` for the pgcraft row-literal codec.
//!
//! The derive collects the `#[row(…)]` attributes of a struct into a static
//! field table — one decode/encode/is-zero function triple per tagged field
//! — and implements the `Row` trait over it, together with the
//! `FromRowText`/`ToRowText` impls that let the type appear as a nested
//! composite inside another record.
//!
//! Tag grammar, mirrored by the runtime validator:
//!
//! ```ignore
//! #[row(1)]
//! #[row(2, omitempty)]
//! #[row(3, required)]
//! #[row(4, default = "0.0")]
//! #[row("5,omitempty")]   // raw tag string passthrough
//! ```
//!
//! Untagged fields are ignored by the codec. Option *semantics* (conflicts,
//! duplicate positions, unknown option names) are validated at runtime by
//! `Layout::build`, so they surface as typed validation errors rather than
//! compile failures.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Lit, LitInt, LitStr, Token};

/// One argument inside `#[row(…)]`.
enum RowArg {
    /// `1` — the position.
    Position(LitInt),
    /// `"1,omitempty"` — a raw tag string.
    Raw(LitStr),
    /// `omitempty`, `required`, or any future flag.
    Flag(Ident),
    /// `default = "x"`.
    KeyValue(Ident, Lit),
}

impl Parse for RowArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitInt) {
            return Ok(Self::Position(input.parse()?));
        }
        if input.peek(LitStr) {
            return Ok(Self::Raw(input.parse()?));
        }
        let ident: Ident = input.parse()?;
        if input.peek(Token![=]) {
            input.parse::<Token![=]>()?;
            let value: Lit = input.parse()?;
            return Ok(Self::KeyValue(ident, value));
        }
        Ok(Self::Flag(ident))
    }
}

/// Render the attribute arguments back into the textual tag form the
/// runtime parser consumes.
fn tag_string(args: &Punctuated<RowArg, Token![,]>) -> syn::Result<String> {
    if args.len() == 1 {
        if let Some(RowArg::Raw(s)) = args.first() {
            return Ok(s.value());
        }
    }

    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            RowArg::Position(lit) => parts.push(lit.base10_digits().to_owned()),
            RowArg::Raw(lit) => {
                return Err(syn::Error::new(
                    lit.span(),
                    "a raw tag string must be the only #[row(…)] argument",
                ))
            }
            RowArg::Flag(ident) => parts.push(ident.to_string()),
            RowArg::KeyValue(ident, value) => {
                let rendered = match value {
                    Lit::Str(s) => s.value(),
                    Lit::Int(i) => i.base10_digits().to_owned(),
                    Lit::Float(f) => f.base10_digits().to_owned(),
                    Lit::Bool(b) => b.value.to_string(),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "unsupported literal in #[row(…)] option",
                        ))
                    }
                };
                parts.push(format!("{ident}={rendered}"));
            }
        }
    }
    Ok(parts.join(","))
}

/// Derive the `Row` trait for a named-field struct.
#[proc_macro_derive(Row, attributes(row))]
pub fn derive_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Row cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Row can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Row can only be derived for structs",
            ))
        }
    };

    let mut hooks = Vec::new();
    let mut defs = Vec::new();

    for field in fields {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("row")) else {
            continue;
        };
        let args = attr.parse_args_with(Punctuated::<RowArg, Token![,]>::parse_terminated)?;
        let tag = tag_string(&args)?;

        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_name = ident.to_string();
        let decode_fn = format_ident!("__row_decode_{}", ident);
        let encode_fn = format_ident!("__row_encode_{}", ident);
        let zero_fn = format_ident!("__row_is_zero_{}", ident);

        hooks.push(quote! {
            fn #decode_fn(record: &mut #name, s: &str) -> ::pgcraft_row::RowResult<()> {
                record.#ident = ::pgcraft_row::FromRowText::from_row_text(s)?;
                ::std::result::Result::Ok(())
            }
            fn #encode_fn(record: &#name) -> ::pgcraft_row::RowResult<::std::string::String> {
                ::pgcraft_row::ToRowText::to_row_text(&record.#ident)
            }
            fn #zero_fn(record: &#name) -> bool {
                ::pgcraft_row::ToRowText::is_zero(&record.#ident)
            }
        });
        defs.push(quote! {
            ::pgcraft_row::FieldDef {
                name: #field_name,
                tag: #tag,
                decode: #decode_fn,
                encode: #encode_fn,
                is_zero: #zero_fn,
            }
        });
    }

    Ok(quote! {
        const _: () = {
            #(#hooks)*

            static __ROW_FIELDS: &[::pgcraft_row::FieldDef<#name>] = &[#(#defs),*];

            impl ::pgcraft_row::Row for #name {
                fn row_fields() -> &'static [::pgcraft_row::FieldDef<Self>] {
                    __ROW_FIELDS
                }

                fn row_layout() -> ::pgcraft_row::RowResult<&'static ::pgcraft_row::Layout<Self>> {
                    static __ROW_LAYOUT: ::std::sync::OnceLock<
                        ::pgcraft_row::RowResult<::pgcraft_row::Layout<#name>>,
                    > = ::std::sync::OnceLock::new();
                    match __ROW_LAYOUT.get_or_init(|| {
                        ::pgcraft_row::Layout::build(<#name as ::pgcraft_row::Row>::row_fields())
                    }) {
                        ::std::result::Result::Ok(layout) => ::std::result::Result::Ok(layout),
                        ::std::result::Result::Err(e) => {
                            ::std::result::Result::Err(::std::clone::Clone::clone(e))
                        }
                    }
                }
            }

            impl ::pgcraft_row::FromRowText for #name {
                fn from_row_text(s: &str) -> ::pgcraft_row::RowResult<Self> {
                    ::pgcraft_row::from_str(s)
                }
            }

            impl ::pgcraft_row::ToRowText for #name {
                fn to_row_text(&self) -> ::pgcraft_row::RowResult<::std::string::String> {
                    ::std::result::Result::Ok(::pgcraft_row::writer::escape(
                        &::pgcraft_row::to_string(self)?,
                    ))
                }

                fn is_zero(&self) -> bool {
                    self == &Self::default()
                }
            }
        };
    })
}
