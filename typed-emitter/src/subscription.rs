//! 声明式订阅表（Subscriptions）
//!
//! 每个发射器类型对应一张有序订阅表，记录“哪个处理器以何种方式监听哪个事件”。
//! 表在类型层面组装（通常由 `#[listeners]` 生成），并在 [`construct`](crate::construct)
//! 时针对新实例按顺序逐条执行，因此注册顺序即组装顺序。
//!
//! 两种绑定方式：
//! - 自绑定（[`Binding::SelfBound`]）：处理器以实例为接收者，`Fn(&T, &Args)`；
//! - 类绑定（[`Binding::ClassBound`]）：类型上的关联函数，显式接收共享实例句柄，
//!   `Fn(&Arc<T>, &Args)`。
//!
//! 监听器只持有实例的 `Weak`，不会延长实例生命周期。
//!
use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::construct::Emitter;
use crate::event::{Declares, Event};
use crate::listener::Listener;

/// 订阅方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    On,
    Once,
}

/// 处理器绑定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    SelfBound,
    ClassBound,
}

/// 订阅步骤的元信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub event: &'static str,
    pub mode: Mode,
    pub binding: Binding,
    pub handler: &'static str,
}

/// 声明式处理器的返回值
///
/// `()` 无需处理；`Result<(), E>` 的 `Err` 记录为 `error!` 日志，
/// 不会传播给发布方。其它返回类型在编译期被拒绝。
#[diagnostic::on_unimplemented(
    message = "declared listener returns `{Self}`",
    note = "handlers must return `()` or `Result<(), E>` where `E: Display`"
)]
pub trait HandlerOutput {
    fn report(self, handler: &'static str);
}

impl HandlerOutput for () {
    fn report(self, _handler: &'static str) {}
}

impl<E: fmt::Display> HandlerOutput for Result<(), E> {
    fn report(self, handler: &'static str) {
        if let Err(err) = self {
            tracing::error!(handler, error = %err, "declared listener failed");
        }
    }
}

type AttachFn<T> = Box<dyn Fn(&Arc<T>) + Send + Sync>;

struct Step<T> {
    info: StepInfo,
    attach: AttachFn<T>,
}

/// 有序订阅表
pub struct Subscriptions<T: Emitter> {
    steps: Vec<Step<T>>,
}

impl<T: Emitter> Subscriptions<T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// 自绑定：每次事件 `E` 发布时调用 `handler(&instance, args)`
    pub fn on<E: Event>(self, handler: impl Fn(&T, &E::Args) + Send + Sync + 'static) -> Self
    where
        T::Events: Declares<E>,
    {
        let name = type_name_of_val(&handler);
        self.push::<E>(
            Mode::On,
            Binding::SelfBound,
            name,
            Arc::new(move |this: &Arc<T>, args: &E::Args| handler(&**this, args)),
        )
    }

    /// 自绑定，仅首次发布时调用
    pub fn once<E: Event>(self, handler: impl Fn(&T, &E::Args) + Send + Sync + 'static) -> Self
    where
        T::Events: Declares<E>,
    {
        let name = type_name_of_val(&handler);
        self.push::<E>(
            Mode::Once,
            Binding::SelfBound,
            name,
            Arc::new(move |this: &Arc<T>, args: &E::Args| handler(&**this, args)),
        )
    }

    /// 类绑定：每次事件 `E` 发布时调用 `handler(&Arc<instance>, args)`
    pub fn on_class<E: Event>(
        self,
        handler: impl Fn(&Arc<T>, &E::Args) + Send + Sync + 'static,
    ) -> Self
    where
        T::Events: Declares<E>,
    {
        let name = type_name_of_val(&handler);
        self.push::<E>(Mode::On, Binding::ClassBound, name, Arc::new(handler))
    }

    /// 类绑定，仅首次发布时调用
    pub fn once_class<E: Event>(
        self,
        handler: impl Fn(&Arc<T>, &E::Args) + Send + Sync + 'static,
    ) -> Self
    where
        T::Events: Declares<E>,
    {
        let name = type_name_of_val(&handler);
        self.push::<E>(Mode::Once, Binding::ClassBound, name, Arc::new(handler))
    }

    /// 为最近一步设置处理器名称（用于日志与检查）
    pub fn label(mut self, handler: &'static str) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.info.handler = handler;
        }
        self
    }

    /// 将另一张表追加到本表之后，先执行本表的步骤
    pub fn extend(mut self, other: Subscriptions<T>) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepInfo> {
        self.steps.iter().map(|step| &step.info)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 按顺序把每一步订阅到实例的发射器上
    pub(crate) fn apply(self, this: &Arc<T>) {
        for step in self.steps {
            tracing::debug!(
                event = step.info.event,
                mode = ?step.info.mode,
                binding = ?step.info.binding,
                handler = step.info.handler,
                "subscribe declared listener"
            );
            (step.attach)(this);
        }
    }

    fn push<E: Event>(
        mut self,
        mode: Mode,
        binding: Binding,
        handler: &'static str,
        forward: Arc<dyn Fn(&Arc<T>, &E::Args) + Send + Sync>,
    ) -> Self
    where
        T::Events: Declares<E>,
    {
        let attach = move |this: &Arc<T>| {
            let weak = Arc::downgrade(this);
            let forward = Arc::clone(&forward);
            let listener = Listener::<E::Args>::new(move |args: &E::Args| {
                if let Some(this) = weak.upgrade() {
                    forward(&this, args);
                }
            });
            match mode {
                Mode::On => this.emitter().subscribe::<E>(listener),
                Mode::Once => this.emitter().subscribe_once::<E>(listener),
            };
        };

        self.steps.push(Step {
            info: StepInfo {
                event: E::NAME,
                mode,
                binding,
                handler,
            },
            attach: Box::new(attach),
        });
        self
    }
}

impl<T: Emitter> Default for Subscriptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Emitter> fmt::Debug for Subscriptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.steps()).finish()
    }
}
