//! TCP 后端
//!
//! 控制盒的串口经 ser2net 之类的转发器挂在网络上时，通过 TCP 连接读写同一条字节流。
//! 转发器通常要求每条命令以 `" \n"` 结尾（`Terminator::SpaceNewline`）。

use crate::{SerialDeviceError, SerialDeviceErrorKind, SerialError, Transport};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 单次读取缓冲区大小
const READ_CHUNK: usize = 256;

/// `set_read_timeout` 不接受零值
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// 网络连接参数
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TcpConfig {
    pub host: String,
    pub port: u16,
    /// 建立连接的超时（毫秒）
    pub connect_timeout_ms: u64,
}

impl TcpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            connect_timeout_ms: 3000,
        }
    }
}

/// TCP 连接
pub struct TcpTransport {
    address: String,
    stream: Option<TcpStream>,
    current_timeout: Option<Duration>,
}

impl TcpTransport {
    /// 连接转发器（依次尝试解析出的每个地址）
    ///
    /// # Errors
    /// - `SerialError::Connection`: 地址无法解析、连接被拒绝或超时
    pub fn connect(config: &TcpConfig) -> Result<Self, SerialError> {
        let address = config.address();
        let addrs = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| connect_error(&address, &e))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
                Ok(stream) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to disable Nagle on '{}': {}", address, e);
                    }
                    debug!("Connected to '{}' ({})", address, addr);
                    return Ok(Self {
                        address,
                        stream: Some(stream),
                        current_timeout: None,
                    });
                },
                Err(e) => last_error = Some(e),
            }
        }

        let err = last_error
            .unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "no addresses resolved"));
        Err(connect_error(&address, &err))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, SerialError> {
        self.stream.as_mut().ok_or(SerialError::Closed)
    }
}

fn connect_error(address: &str, e: &std::io::Error) -> SerialError {
    let kind = match e.kind() {
        ErrorKind::NotFound | ErrorKind::ConnectionRefused => SerialDeviceErrorKind::NotFound,
        ErrorKind::PermissionDenied => SerialDeviceErrorKind::AccessDenied,
        ErrorKind::InvalidInput => SerialDeviceErrorKind::UnsupportedConfig,
        ErrorKind::TimedOut => SerialDeviceErrorKind::NoDevice,
        _ => SerialDeviceErrorKind::Backend,
    };
    SerialError::Connection(SerialDeviceError::new(
        kind,
        format!("Failed to connect to '{}': {}", address, e),
    ))
}

impl Transport for TcpTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let stream = self.stream_mut()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        trace!("Wrote {} bytes", bytes.len());
        Ok(())
    }

    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError> {
        let timeout = timeout.max(MIN_READ_TIMEOUT);
        if self.current_timeout != Some(timeout) {
            self.stream_mut()?.set_read_timeout(Some(timeout))?;
            self.current_timeout = Some(timeout);
        }

        let mut buf = [0u8; READ_CHUNK];
        match self.stream_mut()?.read(&mut buf) {
            Ok(0) => {
                warn!("Connection to '{}' closed by peer", self.address);
                self.stream = None;
                Err(SerialError::Closed)
            },
            Ok(n) => {
                trace!("Read {} bytes", n);
                Ok(buf[..n].to_vec())
            },
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Ok(Vec::new())
            },
            Err(e) => Err(SerialError::Io(e)),
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            debug!("Connection to '{}' closed", self.address);
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}
