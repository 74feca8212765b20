//! 确认等待配置

use std::time::Duration;

/// 确认等待的上限与节奏
///
/// 一条命令的等待在以下任一条件满足时以 `Timeout` 结束：
/// - 读取次数达到 `max_polls`
/// - 总等待时间达到 `command_timeout_ms`
///
/// 默认值：单次读取 1 s，最多 30 次，总计 30 s；空读之间休眠 10 ms。
///
/// `completion = "idle_status"` 时，命令写入后每 `status_poll_interval_ms`
/// 发送一次 `?`，直到状态报告为 `Idle`。此模式下 `max_polls` 只计没有收到
/// 状态报告的读取（控制器无响应），持续运动的总时长由 `command_timeout_ms` 限制。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AckConfig {
    /// 单次读取超时（毫秒）
    pub read_timeout_ms: u64,
    /// 最大读取次数
    pub max_polls: u32,
    /// 单条命令的总等待上限（毫秒）
    pub command_timeout_ms: u64,
    /// 空读之后的休眠间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 完成判定方式
    pub completion: Completion,
    /// `idle_status` 模式下状态查询的间隔（毫秒）
    pub status_poll_interval_ms: u64,
}

/// 命令完成的判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Completion {
    /// 输入中出现确认 token
    #[default]
    Ack,
    /// 轮询 `?`，直到状态报告为 `Idle`
    IdleStatus,
}

impl Default for AckConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 1000,
            max_polls: 30,
            command_timeout_ms: 30_000,
            poll_interval_ms: 10,
            completion: Completion::Ack,
            status_poll_interval_ms: 100,
        }
    }
}

impl AckConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }
}
