//! 事件发射器统一错误定义
//!
//! 类型层面的错误（事件名/参数形状不匹配）全部在编译期拒绝，
//! 这里只保留运行期无法静态排除的最小集合。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// 错误通道事件在没有任何监听器时被发布
    #[error("unhandled error event: {event}")]
    Unhandled { event: &'static str },

    /// 声明式监听器已挂载过，同一实例不允许重复挂载
    #[error("declared listeners already attached: emitter={emitter}")]
    AlreadyInitialized { emitter: &'static str },
}

impl EmitterError {
    pub fn unhandled(event: &'static str) -> Self {
        Self::Unhandled { event }
    }

    pub fn already_initialized(emitter: &'static str) -> Self {
        Self::AlreadyInitialized { emitter }
    }
}

/// 统一 Result 类型别名
pub type EmitterResult<T> = Result<T, EmitterError>;
