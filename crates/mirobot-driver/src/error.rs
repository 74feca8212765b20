//! 驱动层错误类型定义

use mirobot_protocol::{ArmState, ProtocolError};
use mirobot_serial::{SerialDeviceError, SerialError};
use std::time::Duration;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 无法打开串口（致命，整个会话不可用）
    #[error("Connection error: {0}")]
    Connection(#[from] SerialDeviceError),

    /// 命令执行过程中的串口 IO 错误
    #[error("Transport failure while executing {command:?}: {source}")]
    Transport {
        command: String,
        #[source]
        source: SerialError,
    },

    /// 在等待上限内没有观察到确认
    ///
    /// 此时机械臂的物理状态未知，不应继续执行后续运动。
    #[error("Timed out after {waited:?} waiting for acknowledgment of {command:?}")]
    Timeout { command: String, waited: Duration },

    /// 等待确认期间被取消
    #[error("Cancelled while waiting for acknowledgment of {command:?}")]
    Cancelled { command: String },

    /// 最近一次状态报告不是 `Idle`，拒绝发送新的运动命令
    ///
    /// 上一条命令可能仍在执行；等待空闲（`wait_for_idle`）后再发送。
    #[error("Refusing to send {command:?}: arm reported {state:?}, not Idle")]
    NotIdle { command: String, state: ArmState },

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl DriverError {
    /// 是否为会话级致命错误（需要重新连接）
    pub fn is_fatal(&self) -> bool {
        match self {
            DriverError::Connection(_) => true,
            DriverError::Transport { source, .. } => source.is_fatal(),
            DriverError::Timeout { .. } | DriverError::Cancelled { .. } | DriverError::NotIdle { .. } => {
                false
            },
            DriverError::Protocol(_) => false,
        }
    }

    /// 失败的命令文本（若与具体命令相关）
    pub fn command(&self) -> Option<&str> {
        match self {
            DriverError::Transport { command, .. }
            | DriverError::Timeout { command, .. }
            | DriverError::Cancelled { command }
            | DriverError::NotIdle { command, .. } => Some(command),
            DriverError::Connection(_) | DriverError::Protocol(_) => None,
        }
    }
}
