use std::collections::HashMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Token, Type,
    parse::{Parse, ParseStream},
    parse_quote,
    spanned::Spanned,
};

pub(crate) fn expand_decode(input: &DeriveInput) -> Result<TokenStream> {
    let capability = Capability::from_attrs(&input.attrs)?;

    let name = &input.ident;
    let mut generics = input.generics.clone();

    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::unspool::Decode));
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let constructor = match capability {
        Some(Capability::Custom) => quote! { ::unspool::DecodeFn::custom() },
        Some(Capability::Text) => quote! { ::unspool::DecodeFn::text() },
        Some(Capability::Error) => quote! { ::unspool::DecodeFn::error() },
        None => quote! { ::unspool::DecodeFn::record(c) },
    };

    let record = match capability {
        Some(_) => None,
        None => {
            let fields = record_fields(input)?;
            let inserts = fields.iter().map(|field| {
                let FieldMetadata { name, ty, key } = field;

                quote! {
                    fields.insert(#key, c.field::<Self, #ty>(|to| &mut to.#name));
                }
            });

            Some(quote! {
                impl #impl_generics ::unspool::Record for #name #ty_generics #where_clause {
                    fn fields(c: &mut ::unspool::Compiler<'_>) -> ::unspool::Fields<Self> {
                        let mut fields = ::unspool::Fields::new();
                        #(#inserts)*
                        fields
                    }
                }
            })
        }
    };

    let expanded = quote! {
        impl #impl_generics ::unspool::Decode for #name #ty_generics #where_clause {
            fn compile(c: &mut ::unspool::Compiler<'_>) -> ::unspool::DecodeFn<Self> {
                #constructor
            }
        }

        #record
    };

    Ok(expanded.into())
}

fn record_fields(input: &DeriveInput) -> Result<Vec<FieldMetadata>> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`Decode` may only be derived on structs, unless a capability such as `#[decode(custom)]` is selected.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`Decode` may only be derived on structs with named fields, unless a capability such as `#[decode(custom)]` is selected.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields marked `skip`.
        .collect::<Result<Vec<_>>>()?;

    let mut keys = HashMap::new();

    for field in &fields {
        let existing = keys.insert(field.key.value(), field.key.span());

        if existing.is_some() {
            Err(Error::new(field.key.span(), "Field names must be unique."))?;
        }
    }

    Ok(fields)
}

#[derive(Debug, Clone, Copy)]
enum Capability {
    Custom,
    Text,
    Error,
}

impl Capability {
    fn from_attrs(attrs: &[Attribute]) -> Result<Option<Self>> {
        let mut selected = None;

        for attr in attrs.iter().filter(|a| a.path().is_ident("decode")) {
            let capability: Capability = attr.meta.require_list()?.parse_args()?;

            if selected.replace(capability).is_some() {
                Err(Error::new_spanned(
                    attr,
                    "At most one decoding capability may be selected.",
                ))?;
            }
        }

        Ok(selected)
    }
}

impl Parse for Capability {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident = input.parse::<Ident>()?;

        let capability = match ident.to_string().as_str() {
            "custom" => Self::Custom,
            "text" => Self::Text,
            "error" => Self::Error,
            _ => Err(Error::new_spanned(
                &ident,
                "Decoding capability must be `custom`, `text`, or `error`.",
            ))?,
        };

        if !input.is_empty() {
            Err(input.error("Expected a single decoding capability."))?;
        }

        Ok(capability)
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    ty: Type,
    /// The name the field is encoded as.
    key: LitStr,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let mut options = FieldAttribute::default();

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("decode")) {
            let FieldAttribute { rename, skip } = attr.meta.require_list()?.parse_args()?;

            if let Some(rename) = rename {
                if options.rename.replace(rename).is_some() {
                    Err(Error::new_spanned(attr, "Field may only be renamed once."))?;
                }
            }

            options.skip |= skip;
        }

        if options.skip {
            if let Some(rename) = options.rename {
                Err(Error::new_spanned(
                    rename,
                    "Skipped field cannot be renamed.",
                ))?;
            }

            return Ok(None);
        }

        let key = options.rename.unwrap_or_else(|| {
            let unraw = name.to_string();
            let unraw = unraw.strip_prefix("r#").unwrap_or(&unraw);
            LitStr::new(unraw, name.span())
        });

        Ok(Some(Self {
            name,
            ty: field.ty.clone(),
            key,
        }))
    }
}

#[derive(Debug, Default)]
struct FieldAttribute {
    rename: Option<LitStr>,
    skip: bool,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attribute = Self::default();

        while !input.is_empty() {
            let ident = input.parse::<Ident>()?;

            if ident == "skip" {
                attribute.skip = true;
            } else if ident == "rename" {
                input.parse::<Token![=]>()?;

                if attribute.rename.replace(input.parse()?).is_some() {
                    Err(Error::new_spanned(ident, "Field may only be renamed once."))?;
                }
            } else {
                Err(Error::new_spanned(
                    ident,
                    "Field option must be `rename = \"...\"` or `skip`.",
                ))?;
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(attribute)
    }
}
