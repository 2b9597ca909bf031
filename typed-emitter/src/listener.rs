//! 监听器句柄（Listener / RawListener）
//!
//! `Listener<A>` 包装 `Arc<dyn Fn(&A)>`，克隆廉价，相等性按身份（指针）判定，
//! 这是 `unsubscribe` 能够找回同一监听器的前提。
//!
//! `RawListener<A>` 是注册表中实际存放的包装：一次性监听器会被包一层，
//! 因此其身份与传入 `subscribe_once` 的监听器不同。
//!
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 监听器闭包类型
pub type ListenerFn<A> = dyn Fn(&A) + Send + Sync;

/// 类型化监听器
pub struct Listener<A: 'static> {
    f: Arc<ListenerFn<A>>,
}

impl<A: 'static> Listener<A> {
    pub fn new(f: impl Fn(&A) + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// 直接调用监听器
    pub fn call(&self, args: &A) {
        (self.f)(args)
    }

    /// 两个句柄是否指向同一个监听器
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<A: 'static> Clone for Listener<A> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<A: 'static> PartialEq for Listener<A> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<A: 'static> Eq for Listener<A> {}

impl<A: 'static> fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("ptr", &Arc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}

impl<A: 'static, F> From<F> for Listener<A>
where
    F: Fn(&A) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// 注册表中的监听器包装
pub struct RawListener<A: 'static> {
    inner: Arc<RawInner<A>>,
}

struct RawInner<A: 'static> {
    listener: Listener<A>,
    once: bool,
    fired: AtomicBool,
}

impl<A: 'static> RawListener<A> {
    pub(crate) fn persistent(listener: Listener<A>) -> Self {
        Self::wrap(listener, false)
    }

    pub(crate) fn once(listener: Listener<A>) -> Self {
        Self::wrap(listener, true)
    }

    fn wrap(listener: Listener<A>, once: bool) -> Self {
        Self {
            inner: Arc::new(RawInner {
                listener,
                once,
                fired: AtomicBool::new(false),
            }),
        }
    }

    /// 被包装的原始监听器
    pub fn listener(&self) -> &Listener<A> {
        &self.inner.listener
    }

    pub fn is_once(&self) -> bool {
        self.inner.once
    }

    /// 一次性监听器是否已经触发
    pub fn has_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 抢占一次性监听器的触发权；持久监听器总是返回 true
    pub(crate) fn claim(&self) -> bool {
        !self.inner.once || !self.inner.fired.swap(true, Ordering::AcqRel)
    }
}

impl<A: 'static> Clone for RawListener<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: 'static> PartialEq for RawListener<A> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<A: 'static> Eq for RawListener<A> {}

impl<A: 'static> fmt::Debug for RawListener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawListener")
            .field("listener", &self.inner.listener)
            .field("once", &self.inner.once)
            .field("fired", &self.has_fired())
            .finish()
    }
}
