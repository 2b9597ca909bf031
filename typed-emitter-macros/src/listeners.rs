use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::spanned::Spanned;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, Result as SynResult, Type};

use crate::utils::attr_is;

#[derive(Clone, Copy)]
enum Mode {
    On,
    Once,
}

#[derive(Clone, Copy)]
enum Binding {
    // `&self` 接收者
    SelfBound,
    // 关联函数，首个参数为 `&Arc<Self>`
    ClassBound,
}

struct Step {
    event: Type,
    mode: Mode,
    binding: Binding,
    method: syn::Ident,
    arity: usize,
}

/// #[listeners] 宏实现
/// - 收集固有 impl 块中方法上的 `#[on(Event)]` / `#[once(Event)]`，并将其剥离
/// - 按源码顺序（方法自上而下，同一方法的多个标注自上而下）生成订阅表
/// - 为类型实现 `::typed_emitter::Listeners`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new(
            attr.span(),
            "#[listeners] does not take arguments",
        ));
    }

    let mut item_impl: ItemImpl = syn::parse2(item)?;

    if let Some((_, path, _)) = &item_impl.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[listeners] must be placed on an inherent impl block",
        ));
    }

    let mut steps = Vec::new();
    for impl_item in item_impl.items.iter_mut() {
        if let ImplItem::Fn(method) = impl_item {
            collect_steps(method, &mut steps)?;
        }
    }

    let self_ty = &item_impl.self_ty;
    let type_label = self_ty.to_token_stream().to_string().replace(' ', "");
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();

    let chain = steps.iter().map(|step| step_tokens(step, &type_label));

    Ok(quote! {
        #item_impl

        impl #impl_generics ::typed_emitter::Listeners for #self_ty #where_clause {
            fn subscriptions() -> ::typed_emitter::Subscriptions<Self> {
                ::typed_emitter::Subscriptions::<Self>::new()
                    #( #chain )*
            }
        }
    })
}

// 解析并剥离方法上的 on/once 标注
fn collect_steps(method: &mut ImplItemFn, steps: &mut Vec<Step>) -> SynResult<()> {
    let mut retained_attrs = Vec::new();
    let mut found: Vec<(Mode, Type)> = Vec::new();

    for attr in method.attrs.iter() {
        let mode = if attr_is(attr, "on") {
            Mode::On
        } else if attr_is(attr, "once") {
            Mode::Once
        } else {
            retained_attrs.push(attr.clone());
            continue;
        };
        let event: Type = attr.parse_args().map_err(|err| {
            syn::Error::new(
                err.span(),
                "expected an event marker type, e.g., #[on(clock_events::Tick)]",
            )
        })?;
        found.push((mode, event));
    }

    if found.is_empty() {
        return Ok(());
    }
    method.attrs = retained_attrs;

    let sig = &method.sig;
    if let Some(token) = &sig.asyncness {
        return Err(syn::Error::new(
            token.span(),
            "listener methods must be synchronous",
        ));
    }
    if sig.generics.type_params().next().is_some() || sig.generics.const_params().next().is_some()
    {
        return Err(syn::Error::new(
            sig.generics.span(),
            "listener methods cannot have type or const parameters",
        ));
    }

    let (binding, arity) = match sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) => {
            let plain_ref = receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none();
            if !plain_ref {
                return Err(syn::Error::new(
                    receiver.span(),
                    "listener methods take `&self`; use an associated fn with `&Arc<Self>` as first parameter for class-bound listeners",
                ));
            }
            (Binding::SelfBound, sig.inputs.len() - 1)
        }
        Some(FnArg::Typed(_)) => (Binding::ClassBound, sig.inputs.len() - 1),
        None => {
            return Err(syn::Error::new(
                sig.ident.span(),
                "class-bound listeners must take the instance (`&Arc<Self>`) as first parameter",
            ));
        }
    };

    for (mode, event) in found {
        steps.push(Step {
            event,
            mode,
            binding,
            method: sig.ident.clone(),
            arity,
        });
    }
    Ok(())
}

fn step_tokens(step: &Step, type_label: &str) -> TokenStream {
    let Step {
        event,
        mode,
        binding,
        method,
        arity,
    } = step;

    let bindings: Vec<syn::Ident> = (0..*arity).map(|i| format_ident!("a{}", i)).collect();
    let destructure = if bindings.is_empty() {
        quote! { let _ = args; }
    } else {
        quote! { let ( #(#bindings,)* ) = args; }
    };
    let label = format!("{type_label}::{method}");

    let (register, receiver) = match (mode, binding) {
        (Mode::On, Binding::SelfBound) => (quote!(on), quote!(&Self)),
        (Mode::Once, Binding::SelfBound) => (quote!(once), quote!(&Self)),
        (Mode::On, Binding::ClassBound) => (quote!(on_class), quote!(&::std::sync::Arc<Self>)),
        (Mode::Once, Binding::ClassBound) => {
            (quote!(once_class), quote!(&::std::sync::Arc<Self>))
        }
    };

    quote! {
        .#register::<#event>(
            |this: #receiver, args: &<#event as ::typed_emitter::Event>::Args| {
                #destructure
                ::typed_emitter::HandlerOutput::report(
                    Self::#method(this #(, #bindings)*),
                    #label,
                );
            }
        )
        .label(#label)
    }
}
