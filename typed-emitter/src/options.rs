//! 发射器配置（EmitterOptions）
//!
//! 可通过 `EmitterOptions::builder()` 构造，也可以从应用配置反序列化；
//! 缺省字段取默认值。
//!
use bon::Builder;
use serde::Deserialize;

/// 默认的单事件监听器上限，超出时仅告警
pub const DEFAULT_MAX_LISTENERS: usize = 10;

#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitterOptions {
    /// 单个事件的监听器数量告警阈值，`0` 表示不限制
    #[builder(default = DEFAULT_MAX_LISTENERS)]
    pub max_listeners: usize,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}
