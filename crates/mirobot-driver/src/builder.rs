//! Builder 模式实现
//!
//! 提供链式构造 `ArmController` 的便捷方式。

use crate::config::AckConfig;
use crate::controller::ArmController;
use crate::error::DriverError;
use crate::state::CancelToken;
use mirobot_protocol::CodecConfig;
use mirobot_serial::{SerialConfig, SerialError, TcpConfig, TcpTransport, Transport};
use tracing::info;

/// ArmController Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use mirobot_driver::{AckConfig, ArmControllerBuilder};
///
/// let mut arm = ArmControllerBuilder::new()
///     .port("/dev/ttyUSB0")
///     .baud_rate(115_200)
///     .ack_config(AckConfig {
///         max_polls: 60,
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
///
/// arm.home().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArmControllerBuilder {
    serial: SerialConfig,
    codec: CodecConfig,
    ack: AckConfig,
    tcp: Option<TcpConfig>,
    cancel: Option<CancelToken>,
}

impl ArmControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置串口设备路径
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.serial.port = port.into();
        self
    }

    /// 设置波特率（默认 115200）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    /// 一次性设置全部串口参数
    pub fn serial_config(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    pub fn codec_config(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    pub fn ack_config(mut self, ack: AckConfig) -> Self {
        self.ack = ack;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 经网络串口转发器连接（设置后 `connect()` 使用 TCP 而不是本地串口）
    pub fn tcp(mut self, tcp: TcpConfig) -> Self {
        self.tcp = Some(tcp);
        self
    }

    /// 打开串口并构建控制器
    ///
    /// # Errors
    /// - `DriverError::Connection`: 串口无法打开（致命，不重试）
    #[cfg(feature = "native")]
    pub fn build(self) -> Result<ArmController<mirobot_serial::SerialPortTransport>, DriverError> {
        let transport = open_serial(&self.serial)?;
        Ok(self.build_with_transport(transport))
    }

    /// 连接 TCP 转发器并构建控制器
    ///
    /// # Errors
    /// - `DriverError::Connection`: 地址无法解析或连接失败
    pub fn build_tcp(self, tcp: &TcpConfig) -> Result<ArmController<TcpTransport>, DriverError> {
        let transport = open_tcp(tcp)?;
        Ok(self.build_with_transport(transport))
    }

    /// 按配置选择后端：设置了 `tcp` 时连接转发器，否则打开本地串口
    pub fn connect(self) -> Result<ArmController<Box<dyn Transport>>, DriverError> {
        let transport: Box<dyn Transport> = match &self.tcp {
            Some(tcp) => Box::new(open_tcp(tcp)?),
            None => open_serial_boxed(&self.serial)?,
        };
        Ok(self.build_with_transport(transport))
    }

    /// 使用已打开的传输层构建控制器（测试 / 自定义后端）
    pub fn build_with_transport<T: Transport>(self, transport: T) -> ArmController<T> {
        let controller = ArmController::new(transport, self.codec, self.ack);
        match self.cancel {
            Some(cancel) => controller.with_cancel_token(cancel),
            None => controller,
        }
    }
}

#[cfg(feature = "native")]
fn open_serial(serial: &SerialConfig) -> Result<mirobot_serial::SerialPortTransport, DriverError> {
    let transport = mirobot_serial::SerialPortTransport::open(serial).map_err(connection_error)?;
    info!("Connected to arm on '{}' at {} baud", serial.port, serial.baud_rate);
    Ok(transport)
}

#[cfg(feature = "native")]
fn open_serial_boxed(serial: &SerialConfig) -> Result<Box<dyn Transport>, DriverError> {
    Ok(Box::new(open_serial(serial)?))
}

#[cfg(not(feature = "native"))]
fn open_serial_boxed(serial: &SerialConfig) -> Result<Box<dyn Transport>, DriverError> {
    Err(DriverError::Connection(mirobot_serial::SerialDeviceError::new(
        mirobot_serial::SerialDeviceErrorKind::UnsupportedConfig,
        format!("Serial backend not compiled in (feature `native`), cannot open '{}'", serial.port),
    )))
}

fn open_tcp(tcp: &TcpConfig) -> Result<TcpTransport, DriverError> {
    let transport = TcpTransport::connect(tcp).map_err(connection_error)?;
    info!("Connected to arm via '{}'", tcp.address());
    Ok(transport)
}

fn connection_error(e: SerialError) -> DriverError {
    match e {
        SerialError::Connection(device) => DriverError::Connection(device),
        other => DriverError::Connection(other.to_string().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirobot_serial::mock::MockTransport;

    #[test]
    fn test_builder_defaults() {
        let builder = ArmControllerBuilder::new();
        assert_eq!(builder.serial.baud_rate, 115_200);
        assert_eq!(builder.serial.read_timeout_ms, 1000);
        assert_eq!(builder.ack, AckConfig::default());
        assert!(builder.tcp.is_none());
        assert!(builder.cancel.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let builder = ArmControllerBuilder::new().port("/dev/ttyACM1").baud_rate(9600);
        assert_eq!(builder.serial.port, "/dev/ttyACM1");
        assert_eq!(builder.serial.baud_rate, 9600);

        // 最后一次设置生效
        let builder = builder.port("COM3");
        assert_eq!(builder.serial.port, "COM3");
    }

    #[test]
    fn test_build_with_transport_shares_cancel_token() {
        let token = CancelToken::new();
        let arm = ArmControllerBuilder::new()
            .cancel_token(token.clone())
            .build_with_transport(MockTransport::acking());

        token.cancel();
        assert!(arm.cancel_token().is_cancelled());
    }

    #[test]
    fn test_connect_uses_tcp_when_configured() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || listener.accept().map(|_| ()));

        let arm = ArmControllerBuilder::new()
            .port("/dev/no-such-mirobot-port")
            .tcp(TcpConfig::new("127.0.0.1", port))
            .connect()
            .unwrap();
        assert_eq!(arm.state(), crate::ControllerState::Idle);
        server.join().unwrap().unwrap();
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_build_missing_port_is_connection_error() {
        let result = ArmControllerBuilder::new().port("/dev/no-such-mirobot-port").build();
        match result {
            Err(err) => {
                assert!(matches!(err, DriverError::Connection(_)));
                assert!(err.is_fatal());
            },
            Ok(_) => panic!("Opening a missing port must fail"),
        }
    }
}
