//! # Mirobot Control
//!
//! 高层运动流程：声明式的步骤列表 + 顺序执行器。
//!
//! - `sequence`: 步骤定义、序列文件（TOML / JSON）、内置取放演示
//! - `sequencer`: 逐步执行，任一步失败立即中止（不做部分恢复）
//! - `config`: 机械臂连接配置段
//!
//! 同一个控制器可以执行任意序列，演示流程只是其中一份数据。

pub mod config;
mod error;
pub mod sequence;
pub mod sequencer;

pub use config::ArmSettings;
pub use error::{ConfigError, SequenceError};
pub use sequence::{Sequence, Step};
pub use sequencer::{ArmOps, SequenceReport, Sequencer};
