//! 基于 `serialport` crate 的真实串口后端

use crate::{SerialConfig, SerialDeviceError, SerialDeviceErrorKind, SerialError, Transport};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// 单次读取缓冲区大小
const READ_CHUNK: usize = 256;

/// 真实串口连接
///
/// 打开后在整个会话期间持有，`close()` 或 drop 时释放。
pub struct SerialPortTransport {
    port_name: String,
    port: Option<Box<dyn SerialPort>>,
    current_timeout: Duration,
}

impl SerialPortTransport {
    /// 打开串口（8N1，无流控）
    ///
    /// # Errors
    /// - `SerialError::Connection`: 设备不存在、无权限、被占用或参数不支持
    pub fn open(config: &SerialConfig) -> Result<Self, SerialError> {
        let read_timeout = config.read_timeout();
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(read_timeout)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| SerialError::Connection(classify_open_error(&config.port, e)))?;

        debug!("Serial port '{}' opened at {} baud", config.port, config.baud_rate);

        Ok(Self {
            port_name: config.port.clone(),
            port: Some(port),
            current_timeout: read_timeout,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, SerialError> {
        self.port.as_mut().ok_or(SerialError::Closed)
    }
}

fn classify_open_error(port: &str, e: serialport::Error) -> SerialDeviceError {
    let kind = match e.kind() {
        serialport::ErrorKind::NoDevice => SerialDeviceErrorKind::NoDevice,
        serialport::ErrorKind::InvalidInput => SerialDeviceErrorKind::UnsupportedConfig,
        serialport::ErrorKind::Io(ErrorKind::NotFound) => SerialDeviceErrorKind::NotFound,
        serialport::ErrorKind::Io(ErrorKind::PermissionDenied) => {
            SerialDeviceErrorKind::AccessDenied
        },
        serialport::ErrorKind::Io(ErrorKind::ResourceBusy) => SerialDeviceErrorKind::Busy,
        serialport::ErrorKind::Io(_) => SerialDeviceErrorKind::Backend,
        serialport::ErrorKind::Unknown => SerialDeviceErrorKind::Unknown,
    };
    SerialDeviceError::new(kind, format!("Failed to open serial port '{}': {}", port, e))
}

impl Transport for SerialPortTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        trace!("Wrote {} bytes", bytes.len());
        Ok(())
    }

    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError> {
        if timeout != self.current_timeout {
            self.port_mut()?
                .set_timeout(timeout)
                .map_err(|e| SerialError::Io(std::io::Error::other(e)))?;
            self.current_timeout = timeout;
        }

        let mut buf = [0u8; READ_CHUNK];
        match self.port_mut()?.read(&mut buf) {
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
        if self.port.take().is_some() {
            debug!("Serial port '{}' closed", self.port_name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialPortTransport {
    fn drop(&mut self) {
        self.close();
    }
}
