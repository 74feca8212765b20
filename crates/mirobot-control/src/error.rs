//! 控制层错误类型

use crate::sequence::Step;
use mirobot_driver::DriverError;
use std::path::PathBuf;
use thiserror::Error;

/// 序列执行失败
///
/// 携带失败的步骤和最后一条被确认的命令，便于人工恢复。
#[derive(Error, Debug)]
#[error(
    "Sequence {sequence:?} failed at step {} ({step}): {source}; last acknowledged command: {}",
    .step_index + 1,
    .last_acknowledged.as_deref().unwrap_or("<none>")
)]
pub struct SequenceError {
    pub sequence: String,
    /// 从 0 开始的步骤索引
    pub step_index: usize,
    pub step: Step,
    pub last_acknowledged: Option<String>,
    #[source]
    pub source: DriverError,
}

impl SequenceError {
    /// 机械臂物理状态是否未知（超时 / 传输失败 / 取消）
    pub fn arm_state_unknown(&self) -> bool {
        !matches!(self.source, DriverError::Protocol(_))
    }
}

/// 配置 / 序列文件加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),
}
