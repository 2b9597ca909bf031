//! 发射器类型与构造（Emitter / Listeners / construct）
//!
//! 拥有 [`TypedEmitter`] 的类型实现 [`Emitter`]，声明了监听方法的类型再实现
//! [`Listeners`]（通常由 `#[derive(Emitter)]` 与 `#[listeners]` 生成）。
//! [`construct`] 在返回实例之前把订阅表执行且仅执行一次，
//! 因此外部代码观察到实例时，所有声明式订阅都已生效。
//!
use std::any::type_name;
use std::sync::Arc;

use crate::emitter::TypedEmitter;
use crate::error::{EmitterError, EmitterResult};
use crate::event::EventTable;
use crate::subscription::Subscriptions;

/// 拥有类型化发射器的类型
pub trait Emitter: Send + Sync + Sized + 'static {
    type Events: EventTable;

    fn emitter(&self) -> &TypedEmitter<Self::Events>;
}

/// 声明了监听方法的发射器类型
pub trait Listeners: Emitter {
    /// 该类型的订阅表，默认为空
    fn subscriptions() -> Subscriptions<Self> {
        Subscriptions::new()
    }

    /// 把订阅表挂载到实例上，返回订阅的步数
    ///
    /// 同一发射器只能挂载一次，重复挂载返回 [`EmitterError::AlreadyInitialized`]。
    fn attach(this: &Arc<Self>) -> EmitterResult<usize> {
        if !this.emitter().begin_initialization() {
            return Err(EmitterError::already_initialized(type_name::<Self>()));
        }

        let subscriptions = Self::subscriptions();
        let steps = subscriptions.len();
        subscriptions.apply(this);

        tracing::debug!(emitter = type_name::<Self>(), steps, "declared listeners attached");
        Ok(steps)
    }
}

/// 构造实例并挂载声明式监听器
///
/// 若实例的发射器此前已挂载过（例如从另一个 `Arc` 中取回后再次构造），
/// 跳过挂载并告警，保证每个实例至多订阅一次。
pub fn construct<T: Listeners>(value: T) -> Arc<T> {
    let this = Arc::new(value);
    if let Err(err) = T::attach(&this) {
        tracing::warn!(%err, "skip attaching declared listeners");
    }
    this
}
