//! 类型化事件发射器（TypedEmitter）
//!
//! 每个订阅/发布操作都收窄到事件表 `T` 中声明的事件及其参数元组；
//! 运行期行为保持宿主式事件发射器的约定：
//! - 同一事件按注册顺序同步投递，`prepend_*` 插到最前；
//! - 发布时先对监听器列表做快照，再释放锁调用：投递期间新增的监听器不参与本轮，
//!   投递期间被移除的监听器仍会在本轮被调用；
//! - 一次性监听器在调用前被移除并标记已触发，重入发布也不会重复调用；
//! - 监听器 panic 直接传播给发布方，本轮剩余监听器不再调用；
//! - 超过 `max_listeners` 只告警一次，不拒绝注册。
//!
//! 锁从不在回调期间持有，因此监听器内部可以安全地再次订阅、退订或发布。
//!
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{EmitterError, EmitterResult};
use crate::event::{Declares, Event, EventKey, EventTable};
use crate::listener::{Listener, RawListener};
use crate::options::EmitterOptions;

/// 类型化事件发射器
pub struct TypedEmitter<T: EventTable> {
    registry: Mutex<Registry>,
    max_listeners: AtomicUsize,
    // 声明式监听器是否已挂载（每个实例至多一次）
    initialized: AtomicBool,
    _table: PhantomData<fn() -> T>,
}

impl<T: EventTable> TypedEmitter<T> {
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            max_listeners: AtomicUsize::new(options.max_listeners),
            initialized: AtomicBool::new(false),
            _table: PhantomData,
        }
    }

    /// 发布事件，返回是否至少调用了一个监听器
    ///
    /// # Panics
    /// 错误通道事件（`Event::ERROR_CHANNEL`）在没有监听器时发布会 panic，
    /// 需要显式处理时使用 [`TypedEmitter::try_publish`]。
    pub fn publish<E: Event>(&self, args: E::Args) -> bool
    where
        T: Declares<E>,
    {
        match self.try_publish::<E>(args) {
            Ok(delivered) => delivered,
            Err(err) => panic!("{err}"),
        }
    }

    /// 发布事件，返回是否实际调用了监听器
    ///
    /// 错误通道事件没有任何监听器被调用时返回 [`EmitterError::Unhandled`]。
    pub fn try_publish<E: Event>(&self, args: E::Args) -> EmitterResult<bool>
    where
        T: Declares<E>,
    {
        // 快照只是 Arc 引用计数的拷贝
        let snapshot: Vec<RawListener<E::Args>> = {
            let registry = self.registry.lock();
            registry
                .list::<E::Args>(TypeId::of::<E>())
                .map(|list| list.to_vec())
                .unwrap_or_default()
        };

        tracing::trace!(event = E::NAME, listeners = snapshot.len(), "publish");

        let mut invoked = false;
        for raw in snapshot {
            if raw.is_once() {
                // 已被并发的发布方抢先触发
                if !raw.claim() {
                    continue;
                }
                self.remove_raw::<E>(&raw);
            }
            raw.listener().call(&args);
            invoked = true;
        }

        if !invoked && E::ERROR_CHANNEL {
            tracing::error!(event = E::NAME, "error event published without listener");
            return Err(EmitterError::unhandled(E::NAME));
        }
        Ok(invoked)
    }

    /// 发布事件表的运行期取值（例如 `#[event_table]` 枚举的某个变体）
    pub fn emit(&self, event: T) -> bool {
        event.publish_to(self)
    }

    pub fn subscribe<E: Event>(&self, listener: impl Into<Listener<E::Args>>) -> &Self
    where
        T: Declares<E>,
    {
        self.add::<E>(RawListener::persistent(listener.into()), false)
    }

    pub fn subscribe_once<E: Event>(&self, listener: impl Into<Listener<E::Args>>) -> &Self
    where
        T: Declares<E>,
    {
        self.add::<E>(RawListener::once(listener.into()), false)
    }

    pub fn prepend_listener<E: Event>(&self, listener: impl Into<Listener<E::Args>>) -> &Self
    where
        T: Declares<E>,
    {
        self.add::<E>(RawListener::persistent(listener.into()), true)
    }

    pub fn prepend_once_listener<E: Event>(&self, listener: impl Into<Listener<E::Args>>) -> &Self
    where
        T: Declares<E>,
    {
        self.add::<E>(RawListener::once(listener.into()), true)
    }

    /// 移除最近一次注册的同一监听器（一次性包装按其内部监听器匹配）
    pub fn unsubscribe<E: Event>(&self, listener: &Listener<E::Args>) -> &Self
    where
        T: Declares<E>,
    {
        let id = TypeId::of::<E>();
        let mut registry = self.registry.lock();
        if let Some(list) = registry.list_mut::<E::Args>(id) {
            if let Some(pos) = list.iter().rposition(|raw| raw.listener() == listener) {
                list.remove(pos);
            }
        }
        registry.prune(id);
        self
    }

    /// 移除事件 `E` 的全部监听器
    pub fn unsubscribe_all_for<E: Event>(&self) -> &Self
    where
        T: Declares<E>,
    {
        self.registry.lock().remove(TypeId::of::<E>());
        self
    }

    /// 移除所有事件的全部监听器
    pub fn unsubscribe_all(&self) -> &Self {
        self.registry.lock().slots.clear();
        self
    }

    /// 事件 `E` 当前的监听器（一次性包装已解开）
    pub fn listeners_for<E: Event>(&self) -> Vec<Listener<E::Args>>
    where
        T: Declares<E>,
    {
        self.registry
            .lock()
            .list::<E::Args>(TypeId::of::<E>())
            .map(|list| list.iter().map(|raw| raw.listener().clone()).collect())
            .unwrap_or_default()
    }

    /// 事件 `E` 注册表中的原始包装
    pub fn raw_listeners<E: Event>(&self) -> Vec<RawListener<E::Args>>
    where
        T: Declares<E>,
    {
        self.registry
            .lock()
            .list::<E::Args>(TypeId::of::<E>())
            .map(|list| list.to_vec())
            .unwrap_or_default()
    }

    pub fn listener_count_for<E: Event>(&self) -> usize
    where
        T: Declares<E>,
    {
        self.registry
            .lock()
            .list::<E::Args>(TypeId::of::<E>())
            .map_or(0, |list| list.len())
    }

    /// 至少有一个监听器的事件，按首次注册顺序
    pub fn event_names(&self) -> Vec<EventKey<T>> {
        self.registry
            .lock()
            .slots
            .iter()
            .map(|slot| EventKey::from_parts(slot.id, slot.name))
            .collect()
    }

    pub fn set_max_listeners(&self, max: usize) -> &Self {
        self.max_listeners.store(max, Ordering::Relaxed);
        self
    }

    pub fn max_listeners(&self) -> usize {
        self.max_listeners.load(Ordering::Relaxed)
    }

    /// 抢占声明式监听器的挂载权，仅第一次返回 true
    pub(crate) fn begin_initialization(&self) -> bool {
        self.initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn add<E: Event>(&self, raw: RawListener<E::Args>, prepend: bool) -> &Self {
        let id = TypeId::of::<E>();
        let max = self.max_listeners();
        let exceeded = {
            let mut registry = self.registry.lock();
            let count = match registry.list_mut::<E::Args>(id) {
                Some(list) => {
                    if prepend {
                        list.insert(0, raw);
                    } else {
                        list.push(raw);
                    }
                    list.len()
                }
                None => {
                    registry.slots.push(Slot::new::<E>(vec![raw]));
                    1
                }
            };
            registry.take_warning(id, max, count).then_some(count)
        };

        if let Some(count) = exceeded {
            tracing::warn!(
                event = E::NAME,
                table = type_name::<T>(),
                count,
                max,
                "possible listener leak: max listeners exceeded"
            );
        }
        self
    }

    fn remove_raw<E: Event>(&self, raw: &RawListener<E::Args>) {
        let id = TypeId::of::<E>();
        let mut registry = self.registry.lock();
        if let Some(list) = registry.list_mut::<E::Args>(id) {
            list.retain(|r| !r.same(raw));
        }
        registry.prune(id);
    }
}

impl<T: EventTable> Default for TypedEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: EventTable> fmt::Debug for TypedEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        let mut map = f.debug_map();
        for slot in &registry.slots {
            map.entry(&slot.name, &slot.listeners.len());
        }
        map.finish()
    }
}

// ---- 类型擦除的注册表 ----

trait ErasedList: Send + Sync {
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<A: 'static> ErasedList for Vec<RawListener<A>> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Slot {
    id: TypeId,
    name: &'static str,
    listeners: Box<dyn ErasedList>,
    warned: bool,
}

impl Slot {
    fn new<E: Event>(listeners: Vec<RawListener<E::Args>>) -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: E::NAME,
            listeners: Box::new(listeners),
            warned: false,
        }
    }
}

#[derive(Default)]
struct Registry {
    // 保持事件首次注册顺序
    slots: Vec<Slot>,
}

impl Registry {
    fn position(&self, id: TypeId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    fn list<A: 'static>(&self, id: TypeId) -> Option<&Vec<RawListener<A>>> {
        let slot = &self.slots[self.position(id)?];
        slot.listeners.as_any().downcast_ref()
    }

    fn list_mut<A: 'static>(&mut self, id: TypeId) -> Option<&mut Vec<RawListener<A>>> {
        let pos = self.position(id)?;
        self.slots[pos].listeners.as_any_mut().downcast_mut()
    }

    // 超出上限且尚未告警时返回 true，并记下已告警
    fn take_warning(&mut self, id: TypeId, max: usize, count: usize) -> bool {
        if max == 0 || count <= max {
            return false;
        }
        match self.position(id) {
            Some(pos) if !self.slots[pos].warned => {
                self.slots[pos].warned = true;
                true
            }
            _ => false,
        }
    }

    fn remove(&mut self, id: TypeId) {
        self.slots.retain(|slot| slot.id != id);
    }

    // 空列表的事件不再出现在 event_names 中
    fn prune(&mut self, id: TypeId) {
        self.slots
            .retain(|slot| slot.id != id || slot.listeners.len() > 0);
    }
}
