use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Member, Result as SynResult};

use crate::utils::typed_emitter_arg;

/// #[derive(Emitter)] 宏实现
/// - 发射器字段：显式标注 `#[emitter]` 的字段，否则为唯一一个 `TypedEmitter<..>` 类型的字段
/// - `#[emitter(deref)]` 额外生成 `Deref<Target = TypedEmitter<..>>`
pub(crate) fn expand(input: TokenStream) -> SynResult<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;

    let fields = match &input.data {
        Data::Struct(s) => &s.fields,
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "#[derive(Emitter)] only supports structs",
            ));
        }
    };

    let candidates: Vec<(Member, &syn::Field)> = match fields {
        Fields::Named(f) => f
            .named
            .iter()
            .filter_map(|field| field.ident.clone().map(|i| (Member::Named(i), field)))
            .collect(),
        Fields::Unnamed(f) => f
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, field)| (Member::Unnamed(i.into()), field))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    // 先找显式标注的字段
    let marked: Vec<&(Member, &syn::Field)> = candidates
        .iter()
        .filter(|(_, field)| field.attrs.iter().any(|a| a.path().is_ident("emitter")))
        .collect();

    let (member, field) = match marked.as_slice() {
        [one] => (one.0.clone(), one.1),
        [] => {
            let typed: Vec<&(Member, &syn::Field)> = candidates
                .iter()
                .filter(|(_, field)| typed_emitter_arg(&field.ty).is_some())
                .collect();
            match typed.as_slice() {
                [one] => (one.0.clone(), one.1),
                [] => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "#[derive(Emitter)] requires a field of type TypedEmitter<Events>",
                    ));
                }
                _ => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "multiple TypedEmitter fields; mark one with #[emitter]",
                    ));
                }
            }
        }
        [_, second, ..] => {
            return Err(syn::Error::new(
                second.1.span(),
                "only one field may be marked with #[emitter]",
            ));
        }
    };

    let events = typed_emitter_arg(&field.ty).ok_or_else(|| {
        syn::Error::new(
            field.ty.span(),
            "the #[emitter] field must have type TypedEmitter<Events>",
        )
    })?;

    let deref = field_wants_deref(field)?;

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let deref_impl = deref.then(|| {
        quote! {
            impl #impl_generics ::core::ops::Deref for #ident #ty_generics #where_clause {
                type Target = ::typed_emitter::TypedEmitter<#events>;

                fn deref(&self) -> &Self::Target {
                    &self.#member
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::typed_emitter::Emitter for #ident #ty_generics #where_clause {
            type Events = #events;

            fn emitter(&self) -> &::typed_emitter::TypedEmitter<Self::Events> {
                &self.#member
            }
        }

        #deref_impl
    })
}

// 解析字段上的 #[emitter] / #[emitter(deref)]
fn field_wants_deref(field: &syn::Field) -> SynResult<bool> {
    let mut deref = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("emitter")) {
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("deref") {
                deref = true;
                Ok(())
            } else {
                Err(meta.error("unknown key; expected 'deref'"))
            }
        })?;
    }
    Ok(deref)
}
