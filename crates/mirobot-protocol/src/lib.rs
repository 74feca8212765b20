//! # Mirobot Protocol
//!
//! 机械臂串口 G-code 协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `types`: 轴与位姿（`Axis`、`Pose`）
//! - `command`: 命令文本构建（`Command`）
//! - `codec`: 命令编码与 `ok` 确认检测
//! - `status`: `<Idle,...>` 状态报告解析
//!
//! ## 协议约定
//!
//! 命令是纯 ASCII 文本，协议本身不要求结束符；控制器在命令执行完成后
//! 在输入流中返回 `ok`，没有固定分帧，因此确认检测是子串扫描而不是按行解析。

pub mod codec;
pub mod command;
pub mod status;
pub mod types;

// 重新导出常用类型
pub use codec::{AckAccumulator, AckState, AckToken, CodecConfig, LineCodec, Terminator, contains_ack};
pub use command::{Command, DEFAULT_FEED_RATE};
pub use status::{ArmState, ArmStatus, CartesianPose, JointAngles};
pub use types::{Axis, Pose};

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 未定义的轴符号（构造期错误）
    #[error("Invalid axis symbol: {symbol:?}")]
    InvalidAxis { symbol: String },

    /// 确认 token 不能为空
    #[error("Acknowledgment token must not be empty")]
    EmptyAckToken,

    /// 状态报告格式错误
    #[error("Invalid status report: {reason}")]
    InvalidStatus { reason: String },
}
