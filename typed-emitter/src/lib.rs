//! 类型化事件发射器（typed-emitter）
//!
//! 在同步的发布/订阅原语之上提供两层能力：
//! - 编译期类型约束：事件名 → 参数元组，未声明的事件或参数形状不符在编译期即被拒绝；
//! - 声明式订阅：在类型的方法上标注 `#[on(..)]` / `#[once(..)]`，
//!   构造实例时按声明顺序自动订阅，且每个实例只执行一次。
//!
//! 模块划分：
//! - `event`：事件标记类型与事件表（`Event` / `EventTable` / `Declares`）；
//! - `emitter`：`TypedEmitter`，监听器注册表与同步投递；
//! - `listener`：监听器句柄与注册表包装；
//! - `subscription`：有序订阅表（声明式订阅的运行期形态）与处理器返回值约定；
//! - `construct`：`Emitter` / `Listeners` 与 `construct`；
//! - `options` / `error`：配置与错误类型。
//!
//! 典型用法：
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use typed_emitter::{Emitter, TypedEmitter, construct, event_table, listeners};
//!
//! #[event_table]
//! pub enum ClockEvents {
//!     Tick(u64),
//!     Reset,
//! }
//!
//! #[derive(Emitter, Default)]
//! struct Clock {
//!     #[emitter(deref)]
//!     events: TypedEmitter<ClockEvents>,
//!     total: AtomicU64,
//! }
//!
//! #[listeners]
//! impl Clock {
//!     #[on(clock_events::Tick)]
//!     fn add(&self, n: &u64) {
//!         self.total.fetch_add(*n, Ordering::Relaxed);
//!     }
//!
//!     #[once(clock_events::Reset)]
//!     fn reset(&self) {
//!         self.total.store(0, Ordering::Relaxed);
//!     }
//! }
//!
//! fn main() {
//!     let clock: Arc<Clock> = construct(Clock::default());
//!     clock.publish::<clock_events::Tick>((3,));
//!     clock.emit(ClockEvents::Tick(4));
//!     assert_eq!(clock.total.load(Ordering::Relaxed), 7);
//! }
//! ```
//!
pub mod construct;
pub mod emitter;
pub mod error;
pub mod event;
pub mod listener;
pub mod options;
pub mod subscription;

pub use construct::{Emitter, Listeners, construct};
pub use emitter::TypedEmitter;
pub use error::{EmitterError, EmitterResult};
pub use event::{Declares, Event, EventKey, EventTable};
pub use listener::{Listener, RawListener};
pub use options::EmitterOptions;
pub use subscription::{Binding, HandlerOutput, Mode, StepInfo, Subscriptions};

#[cfg(feature = "macros")]
pub use typed_emitter_macros::{Emitter, event_table, listeners, on, once};

// 允许在本 crate 内部通过 ::typed_emitter 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::typed_emitter 路径。
extern crate self as typed_emitter;
