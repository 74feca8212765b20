//! 驱动层模块
//!
//! 本模块提供 Mirobot 机械臂的驱动功能（串口或 TCP 串口转发），包括：
//! - 命令发送与完成的阻塞等待（`ok` 确认或 `Idle` 状态轮询，有界）
//! - 发送前丢弃残留输入，迟到的确认不会被当成新命令的回复
//! - 控制器状态机（`Idle → Sending → AwaitingAck → Idle / Faulted`）
//! - 取消令牌（发送前与等待阶段检查）
//! - 状态报告查询
//!
//! # 使用场景
//!
//! 单线程、同步调用：每个高层操作在机械臂完成动作并确认之后才返回，
//! 同一时刻只有一条命令在执行。

mod builder;
pub mod config;
mod controller;
mod error;
pub mod state;

pub use builder::ArmControllerBuilder;
pub use config::{AckConfig, Completion};
pub use controller::ArmController;
pub use error::DriverError;
pub use state::{CancelToken, ControllerState};

// 重新导出上层常用的协议 / 传输类型
pub use mirobot_protocol::{ArmState, ArmStatus, Axis, Command, Pose};
pub use mirobot_serial::{SerialConfig, TcpConfig, TcpTransport, Transport};
