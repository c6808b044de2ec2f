//! Nimbus Derive: procedural macros for Nimbus entities.
//!
//! Provides `#[derive(Entity)]` for table mapping and field selectors.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro mapping a struct onto one relational table.
///
/// # Example
///
/// ```ignore
/// #[derive(Entity, Debug, Clone)]
/// #[entity(table = "clusters")]
/// pub struct Cluster {
///     #[entity(id)]
///     pub id: i64,
///     pub name: String,
///     #[entity(removed)]
///     pub removed: Option<i64>,
/// }
/// ```
///
/// Generates:
/// - one `Field<Self>` constant per struct field (`Cluster::NAME`)
/// - `nimbus_core::store::Entity` implementation (table, key, removed
///   marker, ordered columns, row decoder, value encoder)
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct MappedField {
    ident: syn::Ident,
    ty: syn::Type,
    column: String,
    is_id: bool,
    is_removed: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let table = extract_table_name(input)?.unwrap_or_else(|| name.to_string().to_lowercase());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity can only be derived for structs",
            ));
        }
    };

    let mut mapped = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let mut column = ident.unraw().to_string();
        let mut is_id = false;
        let mut is_removed = false;
        for attr in &field.attrs {
            if !attr.path().is_ident("entity") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else if meta.path.is_ident("removed") {
                    is_removed = true;
                    Ok(())
                } else if meta.path.is_ident("column") {
                    let lit: LitStr = meta.value()?.parse()?;
                    column = lit.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `id`, `removed` or `column = \"...\"`"))
                }
            })?;
        }
        mapped.push(MappedField {
            ident,
            ty: field.ty.clone(),
            column,
            is_id,
            is_removed,
        });
    }

    let mut ids = mapped.iter().filter(|f| f.is_id);
    let key = match (ids.next(), ids.next()) {
        (Some(key), None) => key,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity requires exactly one `#[entity(id)]` field",
            ));
        }
    };
    let mut removed = mapped.iter().filter(|f| f.is_removed);
    let removed_column = match (removed.next(), removed.next()) {
        (Some(field), None) => {
            let column = &field.column;
            quote! { ::core::option::Option::Some(#column) }
        }
        (None, _) => quote! { ::core::option::Option::None },
        (Some(_), Some(extra)) => {
            return Err(syn::Error::new_spanned(
                &extra.ident,
                "Entity allows at most one `#[entity(removed)]` field",
            ));
        }
    };

    let key_ident = &key.ident;
    let key_ty = &key.ty;
    let key_column = &key.column;
    let columns: Vec<&String> = mapped.iter().map(|f| &f.column).collect();

    let field_consts = mapped.iter().map(|f| {
        let const_ident = format_ident!("{}", f.ident.unraw().to_string().to_uppercase());
        let column = &f.column;
        quote! {
            pub const #const_ident: ::nimbus_core::search::Field<#name> =
                ::nimbus_core::search::Field::new(#column);
        }
    });

    // column order == declaration order, decoders index by position
    let decoders = mapped.iter().enumerate().map(|(idx, f)| {
        let ident = &f.ident;
        quote! { #ident: row.get(#idx)? }
    });

    let encoders = mapped.iter().map(|f| {
        let ident = &f.ident;
        quote! {
            ::nimbus_core::db::IntoParam::into_scalar(::core::clone::Clone::clone(&self.#ident))
        }
    });

    Ok(quote! {
        impl #name {
            #(#field_consts)*
        }

        impl ::nimbus_core::store::Entity for #name {
            type Key = #key_ty;

            const TABLE: &'static str = #table;
            const KEY_COLUMN: &'static str = #key_column;
            const REMOVED_COLUMN: ::core::option::Option<&'static str> = #removed_column;
            const COLUMNS: &'static [&'static str] = &[#(#columns),*];

            fn key(&self) -> Self::Key {
                ::core::clone::Clone::clone(&self.#key_ident)
            }

            fn from_row(row: &::nimbus_core::db::Row<'_>) -> ::nimbus_core::db::SqlResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#decoders),*
                })
            }

            fn values(&self) -> ::std::vec::Vec<::nimbus_core::db::ScalarValue> {
                ::std::vec![#(#encoders),*]
            }
        }
    })
}

fn extract_table_name(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(table)
}
