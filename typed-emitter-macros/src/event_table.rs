use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashMap;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Fields, Ident, Item, LitStr, Result as SynResult, Token};

use crate::utils::snake_case;

/// #[event_table] 宏实现
/// - 仅支持元组变体与单元变体：`Tick(u64)` -> `(u64,)`，`Reset` -> `()`
/// - 为每个变体生成零尺寸标记类型（位于蛇形命名的子模块中）并实现 `Event`
/// - 为枚举实现 `EventTable` 与 `Declares<标记类型>`，枚举取值可直接发布
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream> {
    let cfg: TableAttrConfig = syn::parse2(attr)?;
    let mut input: Item = syn::parse2(item)?;

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[event_table] can only be used on enum types",
            ));
        }
    };

    if !enum_item.generics.params.is_empty() {
        return Err(syn::Error::new(
            enum_item.generics.span(),
            "#[event_table] does not support generic enums",
        ));
    }

    let enum_ident = enum_item.ident.clone();
    let vis = enum_item.vis.clone();
    let module = cfg
        .module
        .unwrap_or_else(|| Ident::new(&snake_case(&enum_ident.to_string()), enum_ident.span()));

    let mut seen: HashMap<String, Span> = HashMap::new();
    let mut markers = Vec::new();
    let mut names = Vec::new();
    let mut arms = Vec::new();

    for v in &mut enum_item.variants {
        let v_ident = v.ident.clone();

        // 变体参数类型
        let tys: Vec<syn::Type> = match &v.fields {
            Fields::Unit => Vec::new(),
            Fields::Unnamed(f) => f.unnamed.iter().map(|field| field.ty.clone()).collect(),
            Fields::Named(_) => {
                return Err(syn::Error::new(
                    v.span(),
                    "#[event_table] supports only tuple or unit variants, e.g., Tick(u64) or Reset",
                ));
            }
        };

        // 解析并剥离变体上的 #[event(...)]
        let mut retained_attrs = Vec::new();
        let mut variant_cfg = VariantEventConfig::default();
        for attr in v.attrs.iter() {
            if attr.path().is_ident("event") {
                variant_cfg.merge(attr)?;
            } else {
                retained_attrs.push(attr.clone());
            }
        }
        v.attrs = retained_attrs;

        let name = variant_cfg
            .name
            .map(|lit| lit.value())
            .unwrap_or_else(|| snake_case(&v_ident.to_string()));
        if seen.insert(name.clone(), v_ident.span()).is_some() {
            return Err(syn::Error::new(
                v_ident.span(),
                format!("duplicate event name '{name}' in event table"),
            ));
        }

        let name_lit = LitStr::new(&name, v_ident.span());
        let doc = format!("Event `{name}` of [`{enum_ident}`](super::{enum_ident}).");
        let error_channel = variant_cfg.error;

        markers.push(quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct #v_ident;
        });

        let bindings: Vec<Ident> = (0..tys.len()).map(|i| format_ident!("a{}", i)).collect();
        let pattern = match &v.fields {
            Fields::Unit => quote! { Self::#v_ident },
            _ => quote! { Self::#v_ident( #(#bindings),* ) },
        };
        arms.push(quote! {
            #pattern => emitter.publish::<#module::#v_ident>(( #(#bindings,)* ))
        });

        names.push((v_ident, name_lit, tys, error_channel));
    }

    let event_impls = names.iter().map(|(v_ident, name_lit, tys, error_channel)| {
        quote! {
            impl ::typed_emitter::Event for #module::#v_ident {
                type Args = ( #(#tys,)* );
                const NAME: &'static str = #name_lit;
                const ERROR_CHANNEL: bool = #error_channel;
            }

            impl ::typed_emitter::Declares<#module::#v_ident> for #enum_ident {}
        }
    });
    let name_lits = names.iter().map(|(_, lit, _, _)| lit);

    // 空枚举没有可匹配的变体
    let publish_body = if arms.is_empty() {
        quote! { match self {} }
    } else {
        quote! { match self { #( #arms, )* } }
    };

    let module_doc = format!("Event marker types of `{enum_ident}`.");

    Ok(quote! {
        #enum_item

        #[doc = #module_doc]
        #vis mod #module {
            #( #markers )*
        }

        #( #event_impls )*

        impl ::typed_emitter::EventTable for #enum_ident {
            const NAMES: &'static [&'static str] = &[ #( #name_lits ),* ];

            fn publish_to(self, emitter: &::typed_emitter::TypedEmitter<Self>) -> bool {
                #publish_body
            }
        }
    })
}

// 解析 event_table 宏键值参数：module = <ident>
struct TableAttrConfig {
    module: Option<Ident>,
}

impl Parse for TableAttrConfig {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut module: Option<Ident> = None;

        if input.is_empty() {
            return Ok(Self { module });
        }

        let pairs: Punctuated<syn::ExprAssign, Token![,]> =
            Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;

        for assign in pairs.into_iter() {
            let key_ident = match *assign.left {
                Expr::Path(p) if p.path.segments.len() == 1 => p.path.segments[0].ident.clone(),
                other => {
                    return Err(syn::Error::new(other.span(), "invalid attribute key"));
                }
            };
            match key_ident.to_string().as_str() {
                "module" => {
                    if module.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'module' in attribute",
                        ));
                    }
                    let ident = match *assign.right {
                        Expr::Path(p) if p.path.segments.len() == 1 => {
                            p.path.segments[0].ident.clone()
                        }
                        other => {
                            return Err(syn::Error::new(
                                other.span(),
                                "expected module identifier for 'module'",
                            ));
                        }
                    };
                    module = Some(ident);
                }
                _ => {
                    return Err(syn::Error::new(
                        key_ident.span(),
                        "unknown key; expected 'module'",
                    ));
                }
            }
        }

        Ok(Self { module })
    }
}

// 变体级配置：#[event(name = "...", error)]
#[derive(Default)]
struct VariantEventConfig {
    name: Option<LitStr>,
    error: bool,
}

impl VariantEventConfig {
    fn merge(&mut self, attr: &syn::Attribute) -> SynResult<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                if self.name.is_some() {
                    return Err(meta.error("duplicate key 'name' for this variant"));
                }
                self.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("error") {
                if self.error {
                    return Err(meta.error("duplicate key 'error' for this variant"));
                }
                self.error = true;
                Ok(())
            } else {
                Err(meta.error("unknown key; expected 'name' | 'error'"))
            }
        })
    }
}
