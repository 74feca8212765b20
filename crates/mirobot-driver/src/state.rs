//! 控制器状态与取消令牌

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 控制器状态机
///
/// ```text
/// Idle → Sending → AwaitingAck → Idle      （成功）
/// Idle → Sending → AwaitingAck → Faulted   （超时 / 传输错误 / 取消）
/// ```
///
/// `Faulted` 只对当前命令是终态，下一条命令仍可尝试。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Sending,
    AwaitingAck,
    Faulted,
}

/// 取消令牌
///
/// 可以跨线程克隆（如 Ctrl-C 处理函数）。发送前已取消则不写入命令；
/// 在 `AwaitingAck` 阶段取消则结束等待。不会打断正在进行的写入。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// 清除取消标记（人工确认机械臂状态之后）
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
