//! # Mirobot Serial Transport Layer
//!
//! 串口硬件抽象层，提供统一的双工字节通道接口。
//!
//! - [`Transport`]：上层（驱动层）唯一依赖的 trait
//! - [`SerialPortTransport`]：基于 `serialport` crate 的真实后端（`native` feature）
//! - [`TcpTransport`]：经网络串口转发器（ser2net）连接的后端
//! - [`mock::MockTransport`]：脚本化的模拟后端（`mock` feature / 测试）
//!
//! 读取超时不是错误：`read_available` 在超时时间内没有数据就返回空 `Vec`。

use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "native")]
mod port;

#[cfg(feature = "native")]
pub use port::SerialPortTransport;

mod tcp;

pub use tcp::{TcpConfig, TcpTransport};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// 串口层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    /// 打开设备失败（设备不存在、无权限、被占用等）
    #[error("Connection error: {0}")]
    Connection(#[from] SerialDeviceError),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// 连接已关闭
    #[error("Transport closed")]
    Closed,
}

impl SerialError {
    /// 是否为整个会话级别的致命错误
    pub fn is_fatal(&self) -> bool {
        match self {
            SerialError::Connection(e) => e.is_fatal(),
            SerialError::Closed => true,
            SerialError::Io(_) => false,
        }
    }
}

/// 设备错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    Busy,
    UnsupportedConfig,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct SerialDeviceError {
    pub kind: SerialDeviceErrorKind,
    pub message: String,
}

impl SerialDeviceError {
    pub fn new(kind: SerialDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            SerialDeviceErrorKind::NoDevice
                | SerialDeviceErrorKind::AccessDenied
                | SerialDeviceErrorKind::NotFound
                | SerialDeviceErrorKind::Busy
        )
    }
}

impl From<String> for SerialDeviceError {
    fn from(message: String) -> Self {
        Self::new(SerialDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for SerialDeviceError {
    fn from(message: &str) -> Self {
        Self::new(SerialDeviceErrorKind::Unknown, message)
    }
}

/// 双工字节通道
///
/// 所有方法都是阻塞的；同一时刻只有一个所有者（控制器）持有通道。
pub trait Transport {
    /// 写入全部字节
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError>;

    /// 在 `timeout` 内读取当前可用的字节；超时返回空 `Vec`
    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError>;

    /// 关闭连接（幂等）
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        (**self).write(bytes)
    }

    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError> {
        (**self).read_available(timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// 串口参数
///
/// 数据位 8、停止位 1、无校验、无流控固定不变，只暴露端口、波特率和读超时。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    /// 设备路径（如 "/dev/ttyUSB0"、"COM3"）
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    /// 机械臂控制器默认波特率
    pub const ARM_BAUD_RATE: u32 = 115_200;
    /// 视觉模块上报链路默认波特率
    pub const REPORT_BAUD_RATE: u32 = 19_200;

    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Default::default()
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: Self::ARM_BAUD_RATE,
            read_timeout_ms: 1000,
        }
    }
}
