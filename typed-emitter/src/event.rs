//! 事件与事件表（Event / EventTable）
//!
//! 事件表是纯编译期契约：事件名 → 参数元组。每个事件由一个零尺寸标记类型表示，
//! 其 `TypeId` 即事件在发射器内部的身份，因此同名事件也不会相互冲突。
//!
//! 通常通过 `#[event_table]` 从一个枚举生成，也可以手写：
//!
//! ```
//! use typed_emitter::{Declares, Event, EventTable, TypedEmitter};
//!
//! struct Tick;
//! impl Event for Tick {
//!     type Args = (u64,);
//!     const NAME: &'static str = "tick";
//! }
//!
//! struct Clock;
//! impl EventTable for Clock {
//!     const NAMES: &'static [&'static str] = &["tick"];
//! }
//! impl Declares<Tick> for Clock {}
//!
//! let emitter = TypedEmitter::<Clock>::new();
//! assert!(!emitter.publish::<Tick>((5,)));
//! ```
//!
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

use crate::emitter::TypedEmitter;

/// 事件标记类型
pub trait Event: 'static {
    /// 事件参数元组，例如 `()`、`(u64,)`、`(String, u32)`
    type Args: 'static;

    /// 事件名（用于日志与 `event_names`）
    const NAME: &'static str;

    /// 是否为错误通道：无监听器时发布被视为致命错误
    const ERROR_CHANNEL: bool = false;
}

/// 事件表：某一发射器类型允许的全部事件
pub trait EventTable: Sized + 'static {
    /// 按声明顺序列出的事件名
    const NAMES: &'static [&'static str];

    /// 将事件表的运行期取值（通常是同名枚举）发布到发射器
    ///
    /// 默认实现不发布任何事件，供只需要编译期约束的手写事件表使用。
    fn publish_to(self, emitter: &TypedEmitter<Self>) -> bool {
        let _ = emitter;
        false
    }
}

/// 事件表 `Self` 声明了事件 `E`
///
/// 发射器的所有订阅/发布操作都以 `T: Declares<E>` 为约束，
/// 未声明的事件在编译期即被拒绝。
pub trait Declares<E: Event>: EventTable {}

/// 事件表中某个事件的键（`event_names` 的元素）
pub struct EventKey<T> {
    id: TypeId,
    name: &'static str,
    _table: PhantomData<fn() -> T>,
}

impl<T: EventTable> EventKey<T> {
    /// 事件 `E` 的键
    pub fn of<E: Event>() -> Self
    where
        T: Declares<E>,
    {
        Self {
            id: TypeId::of::<E>(),
            name: E::NAME,
            _table: PhantomData,
        }
    }

    pub(crate) fn from_parts(id: TypeId, name: &'static str) -> Self {
        Self {
            id,
            name,
            _table: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 该键是否对应事件 `E`
    pub fn is<E: Event>(&self) -> bool
    where
        T: Declares<E>,
    {
        self.id == TypeId::of::<E>()
    }
}

// 手写以避免对 T 施加多余约束
impl<T> Clone for EventKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EventKey<T> {}

impl<T> PartialEq for EventKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EventKey<T> {}

impl<T> std::hash::Hash for EventKey<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for EventKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKey").field(&self.name).finish()
    }
}

impl<T> fmt::Display for EventKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
