use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemStruct, LitStr};

use crate::schema_extraction::{
    doc_text, field_docs, parse_completion_schema_args, require_named_fields,
};

pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match parse_completion_schema_args(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let item_struct = parse_macro_input!(item as ItemStruct);

    if let Err(err) = require_named_fields(&item_struct) {
        return err.to_compile_error().into();
    }

    if !item_struct.generics.params.is_empty() {
        return syn::Error::new(
            item_struct.generics.span(),
            "`#[completion_schema]` does not support generic structs",
        )
        .to_compile_error()
        .into();
    }

    let ident = &item_struct.ident;
    let schema_name = args
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), Span::call_site()));
    let description_tokens = match args
        .description
        .or_else(|| doc_text(&item_struct.attrs).map(|text| LitStr::new(&text, Span::call_site())))
    {
        Some(lit) => quote! { Some(#lit) },
        None => quote! { None },
    };

    let field_doc_tokens: Vec<_> = field_docs(&item_struct)
        .into_iter()
        .map(|(field, doc)| {
            let field_lit = LitStr::new(&field, Span::call_site());
            let doc_lit = LitStr::new(&doc, Span::call_site());
            quote! { (#field_lit, #doc_lit) }
        })
        .collect();

    let type_name = LitStr::new(&ident.to_string(), Span::call_site());

    let expanded = quote! {
        #item_struct

        impl travel_agenta::schema::CompletionSchema for #ident {
            fn schema() -> &'static travel_agenta::schema::SchemaHandle {
                static HANDLE: std::sync::OnceLock<travel_agenta::schema::SchemaHandle> =
                    std::sync::OnceLock::new();
                HANDLE.get_or_init(|| {
                    let settings = schemars::gen::SchemaSettings::draft07().with(|s| {
                        s.inline_subschemas = true;
                        s.option_add_null_type = false;
                    });
                    let mut root = settings.into_generator().into_root_schema_for::<Self>();
                    travel_agenta::schema::apply_doc_comments(
                        &mut root,
                        #schema_name,
                        #description_tokens,
                        &[#(#field_doc_tokens),*],
                    );
                    travel_agenta::schema::SchemaHandle::from_root_schema::<Self>(
                        #schema_name,
                        #type_name,
                        root,
                    )
                })
            }
        }
    };

    expanded.into()
}
