use mirobot_serial::SerialError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// 报告文本不是 `Red` / `Green` / `Blue`
    #[error("Invalid colour label: {0:?}")]
    InvalidLabel(String),

    /// 帧数据长度与尺寸不符；尺寸乘积溢出时 `expected` 为 `usize::MAX`
    #[error("Frame data has {actual} bytes, expected {expected} for {width}x{height}")]
    FrameSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Report link error: {0}")]
    Serial(#[from] SerialError),

    #[error("No colour report received within {0:?}")]
    Timeout(Duration),
}
