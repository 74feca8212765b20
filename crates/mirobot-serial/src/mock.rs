//! Mock 串口
//!
//! 用于测试的模拟控制器：记录所有写入，并按脚本在每次写入后排入回复数据。
//! `MockHandle` 与 `MockTransport` 共享状态，传输层被控制器拿走之后
//! 测试仍然可以通过句柄检查写入记录。

use crate::{SerialError, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// 收发事件（按发生顺序记录）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Write(Vec<u8>),
    Read(Vec<u8>),
}

/// 每次写入后的回复方式
#[derive(Debug, Clone)]
enum Responder {
    /// 不回复
    Silent,
    /// 每次写入都排入同样的分块
    Always(Vec<Vec<u8>>),
    /// 第 n 次写入排入第 n 组分块；脚本用完后不再回复
    Script(VecDeque<Vec<Vec<u8>>>),
}

#[derive(Debug)]
struct MockState {
    incoming: VecDeque<Vec<u8>>,
    responder: Responder,
    events: Vec<MockEvent>,
    open: bool,
    close_calls: usize,
    fail_writes: bool,
    fail_reads: bool,
    empty_read_delay: Duration,
}

/// 模拟串口
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// 检查句柄
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// 创建一个从不回复的模拟串口
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                incoming: VecDeque::new(),
                responder: Responder::Silent,
                events: Vec::new(),
                open: true,
                close_calls: 0,
                fail_writes: false,
                fail_reads: false,
                empty_read_delay: Duration::ZERO,
            })),
        }
    }

    /// 每次写入后立即回复 `ok`
    pub fn acking() -> Self {
        Self::new().always_reply(vec![b"ok".to_vec()])
    }

    /// 每次写入后按给定分块回复
    pub fn always_reply(self, chunks: Vec<Vec<u8>>) -> Self {
        self.state.lock().responder = Responder::Always(chunks);
        self
    }

    /// 按写入顺序逐条回复
    pub fn scripted(self, replies: Vec<Vec<Vec<u8>>>) -> Self {
        self.state.lock().responder = Responder::Script(replies.into());
        self
    }

    /// 无数据时模拟读取阻塞（不超过调用方给定的超时）
    pub fn with_empty_read_delay(self, delay: Duration) -> Self {
        self.state.lock().empty_read_delay = delay;
        self
    }

    pub fn fail_writes(self) -> Self {
        self.state.lock().fail_writes = true;
        self
    }

    pub fn fail_reads(self) -> Self {
        self.state.lock().fail_reads = true;
        self
    }

    /// 直接排入一块输入数据
    pub fn push_incoming(&self, chunk: impl Into<Vec<u8>>) {
        self.state.lock().incoming.push_back(chunk.into());
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(SerialError::Closed);
        }
        if state.fail_writes {
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }

        state.events.push(MockEvent::Write(bytes.to_vec()));

        let reply = match &mut state.responder {
            Responder::Silent => Vec::new(),
            Responder::Always(chunks) => chunks.clone(),
            Responder::Script(replies) => replies.pop_front().unwrap_or_default(),
        };
        state.incoming.extend(reply);
        Ok(())
    }

    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError> {
        let delay = {
            let mut state = self.state.lock();
            if !state.open {
                return Err(SerialError::Closed);
            }
            if state.fail_reads {
                return Err(SerialError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "mock read failure",
                )));
            }
            if let Some(chunk) = state.incoming.pop_front() {
                state.events.push(MockEvent::Read(chunk.clone()));
                return Ok(chunk);
            }
            state.empty_read_delay.min(timeout)
        };

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(Vec::new())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.open = false;
        state.close_calls += 1;
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }
}

impl MockHandle {
    /// 按顺序返回所有写入
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Write(bytes) => Some(bytes.clone()),
                MockEvent::Read(_) => None,
            })
            .collect()
    }

    /// 按顺序返回所有写入（文本形式）
    pub fn written_text(&self) -> Vec<String> {
        self.written()
            .into_iter()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .collect()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().events.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    /// 尚未被读走的输入分块数
    pub fn pending_incoming(&self) -> usize {
        self.state.lock().incoming.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mock_reads_empty() {
        let mut mock = MockTransport::new();
        mock.write(b"$H").unwrap();
        assert!(mock.read_available(Duration::from_millis(1)).unwrap().is_empty());
        assert_eq!(mock.handle().written_text(), vec!["$H".to_string()]);
    }

    #[test]
    fn test_acking_mock_replies_after_each_write() {
        let mut mock = MockTransport::acking();
        let handle = mock.handle();
        assert!(mock.read_available(Duration::ZERO).unwrap().is_empty());

        mock.write(b"$H7").unwrap();
        assert_eq!(mock.read_available(Duration::ZERO).unwrap(), b"ok".to_vec());
        assert_eq!(
            handle.events(),
            vec![MockEvent::Write(b"$H7".to_vec()), MockEvent::Read(b"ok".to_vec())]
        );
    }

    #[test]
    fn test_scripted_mock() {
        let mut mock = MockTransport::new().scripted(vec![
            vec![b"o".to_vec(), b"k".to_vec()],
            vec![b"error".to_vec()],
        ]);
        mock.write(b"a").unwrap();
        assert_eq!(mock.read_available(Duration::ZERO).unwrap(), b"o".to_vec());
        assert_eq!(mock.read_available(Duration::ZERO).unwrap(), b"k".to_vec());
        mock.write(b"b").unwrap();
        assert_eq!(mock.read_available(Duration::ZERO).unwrap(), b"error".to_vec());
        mock.write(b"c").unwrap();
        assert!(mock.read_available(Duration::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut mock = MockTransport::new();
        let handle = mock.handle();
        mock.close();
        mock.close();
        assert!(!handle.is_open());
        assert_eq!(handle.close_calls(), 2);
        assert!(matches!(mock.write(b"x"), Err(SerialError::Closed)));
    }

    #[test]
    fn test_failure_injection() {
        let mut mock = MockTransport::new().fail_writes();
        assert!(matches!(mock.write(b"x"), Err(SerialError::Io(_))));

        let mut mock = MockTransport::new().fail_reads();
        assert!(matches!(mock.read_available(Duration::ZERO), Err(SerialError::Io(_))));
    }
}
