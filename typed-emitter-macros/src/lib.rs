use proc_macro::TokenStream;

mod emitter;
mod event_table;
mod listeners;
mod utils;

/// 事件表宏
/// 将形如：
/// ```ignore
/// pub enum ClockEvents {
///     Tick(u64),
///     #[event(name = "clock.stop", error)]
///     Stop(String),
///     Reset,
/// }
/// ```
/// 的枚举声明为事件表：
/// - 每个变体生成同名零尺寸标记类型，位于蛇形命名的子模块（`clock_events::Tick`）
/// - 变体字段即事件参数元组：`Tick(u64)` -> `(u64,)`，`Reset` -> `()`
/// - 事件名默认取变体名的蛇形形式，可用 `#[event(name = "...")]` 覆写
/// - `#[event(error)]` 标记错误通道：无监听器时发布视为致命错误
/// - `#[event_table(module = clock)]` 可指定子模块名
///
/// 枚举取值本身可直接发布：`emitter.emit(ClockEvents::Tick(1))`。
#[proc_macro_attribute]
pub fn event_table(attr: TokenStream, item: TokenStream) -> TokenStream {
    event_table::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 发射器派生宏
/// - 实现 `::typed_emitter::Emitter`，事件表取自 `TypedEmitter<Events>` 字段
/// - 多个发射器字段时用 `#[emitter]` 指定其一
/// - `#[emitter(deref)]` 额外生成 `Deref<Target = TypedEmitter<Events>>`，
///   使实例可直接调用发射器方法
#[proc_macro_derive(Emitter, attributes(emitter))]
pub fn derive_emitter(input: TokenStream) -> TokenStream {
    emitter::expand(input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 声明式监听宏，用于固有 impl 块
/// - `#[on(Event)]`：每次发布都调用；`#[once(Event)]`：仅首次发布调用
/// - `&self` 方法为自绑定；首参为 `&Arc<Self>` 的关联函数为类绑定
/// - 其余参数依次接收事件参数元组各元素的引用
/// - 返回 `()` 或 `Result<(), E>`；`Err` 记录为错误日志，其它返回类型编译期报错
/// - 订阅顺序即源码顺序；同一方法可多次标注
///
/// 生成 `::typed_emitter::Listeners` 实现，配合 `typed_emitter::construct` 使用。
#[proc_macro_attribute]
pub fn listeners(attr: TokenStream, item: TokenStream) -> TokenStream {
    listeners::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 订阅标注，仅在 `#[listeners]` impl 块内的方法上有效
#[proc_macro_attribute]
pub fn on(attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("on", attr, item)
}

/// 一次性订阅标注，仅在 `#[listeners]` impl 块内的方法上有效
#[proc_macro_attribute]
pub fn once(attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("once", attr, item)
}

// 脱离 #[listeners] 使用时保留原条目并报错，避免连带错误
fn misplaced(name: &str, attr: TokenStream, item: TokenStream) -> TokenStream {
    let _ = attr;
    let item = proc_macro2::TokenStream::from(item);
    let err = syn::Error::new(
        proc_macro2::Span::call_site(),
        format!("#[{name}] is only valid on methods inside a #[listeners] impl block"),
    )
    .to_compile_error();
    quote::quote! {
        #err
        #item
    }
    .into()
}
