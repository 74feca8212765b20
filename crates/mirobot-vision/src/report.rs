//! 颜色报告链路
//!
//! 相机端每识别到一次颜色就写一行标签文本（无结束符）；没有识别结果时不写。
//! 主机端去掉空白后按标签精确匹配，未知内容被丢弃。

use crate::color::ColorLabel;
use crate::error::VisionError;
use mirobot_serial::Transport;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 空读之间的休眠
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 发送端
#[derive(Debug)]
pub struct ColorReporter<T: Transport> {
    transport: T,
    reports_sent: u64,
}

impl<T: Transport> ColorReporter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            reports_sent: 0,
        }
    }

    /// 报告一次识别结果
    ///
    /// 返回是否写入了数据；`None` 不产生任何写入。
    pub fn report(&mut self, label: Option<ColorLabel>) -> Result<bool, VisionError> {
        let Some(label) = label else {
            return Ok(false);
        };
        self.transport.write(label.as_str().as_bytes())?;
        self.reports_sent += 1;
        debug!("Reported colour {}", label);
        Ok(true)
    }

    pub fn reports_sent(&self) -> u64 {
        self.reports_sent
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

/// 接收端
#[derive(Debug)]
pub struct ColorReceiver<T: Transport> {
    transport: T,
    read_timeout: Duration,
    pending: String,
}

impl<T: Transport> ColorReceiver<T> {
    pub fn new(transport: T, read_timeout: Duration) -> Self {
        Self {
            transport,
            read_timeout,
            pending: String::new(),
        }
    }

    /// 等待下一条有效报告
    ///
    /// 连在一起到达的多条报告会被逐条返回。
    ///
    /// # Errors
    /// - `VisionError::Timeout`: `timeout` 内没有有效报告
    /// - `VisionError::Serial`: 链路读取失败
    pub fn receive(&mut self, timeout: Duration) -> Result<ColorLabel, VisionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(label) = self.take_label() {
                return Ok(label);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(VisionError::Timeout(timeout));
            }

            let chunk = self.transport.read_available(remaining.min(self.read_timeout))?;
            if chunk.is_empty() {
                spin_sleep::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
                continue;
            }
            trace!("Report link chunk: {:?}", String::from_utf8_lossy(&chunk));
            self.pending
                .extend(String::from_utf8_lossy(&chunk).chars().filter(|c| !c.is_whitespace()));
        }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// 从缓冲区头部取出一个完整标签
    ///
    /// 头部不可能组成标签时逐字符丢弃，直到缓冲区为空或头部是某个标签的前缀。
    fn take_label(&mut self) -> Option<ColorLabel> {
        let mut discarded = String::new();
        let label = loop {
            if let Some(label) = ColorLabel::ALL
                .into_iter()
                .find(|label| self.pending.starts_with(label.as_str()))
            {
                self.pending.drain(..label.as_str().len());
                break Some(label);
            }

            // 空缓冲区也算前缀
            let partial = ColorLabel::ALL
                .iter()
                .any(|label| label.as_str().starts_with(self.pending.as_str()));
            if partial {
                break None;
            }
            match self.pending.chars().next() {
                Some(c) => {
                    discarded.push(c);
                    self.pending.drain(..c.len_utf8());
                },
                None => break None,
            }
        };

        if !discarded.is_empty() {
            debug!("Discarding unrecognised report text {:?}", discarded);
        }
        label
    }
}
