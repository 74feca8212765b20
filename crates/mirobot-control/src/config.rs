//! 机械臂连接配置段
//!
//! 对应配置文件中的 `[arm]`、`[arm.ack]`、`[arm.codec]` 和可选的 `[arm.tcp]`：
//!
//! ```toml
//! [arm]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//!
//! [arm.ack]
//! max_polls = 30
//! command_timeout_ms = 30000
//!
//! [arm.codec]
//! terminator = "none"
//! ack_token = "ok"
//! ```
//!
//! 控制盒挂在网络串口转发器上时，加上 `[arm.tcp]`（此时忽略 `port`）：
//!
//! ```toml
//! [arm.tcp]
//! host = "robotarm.local"
//! port = 3000
//!
//! [arm.codec]
//! terminator = "space_newline"
//! ```

use mirobot_driver::{AckConfig, ArmControllerBuilder, SerialConfig, TcpConfig};
use mirobot_protocol::CodecConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmSettings {
    /// 串口设备路径
    pub port: String,
    pub baud_rate: u32,
    /// 串口单次读取超时（毫秒）
    pub read_timeout_ms: u64,
    pub ack: AckConfig,
    pub codec: CodecConfig,
    /// 设置后经 TCP 转发器连接，而不是打开本地串口
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpConfig>,
}

impl Default for ArmSettings {
    fn default() -> Self {
        let serial = SerialConfig::default();
        Self {
            port: serial.port,
            baud_rate: serial.baud_rate,
            read_timeout_ms: serial.read_timeout_ms,
            ack: AckConfig::default(),
            codec: CodecConfig::default(),
            tcp: None,
        }
    }
}

impl ArmSettings {
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            read_timeout_ms: self.read_timeout_ms,
        }
    }

    /// 由配置生成控制器 Builder（取消令牌等由调用方继续设置）
    pub fn builder(&self) -> ArmControllerBuilder {
        let builder = ArmControllerBuilder::new()
            .serial_config(self.serial_config())
            .codec_config(self.codec.clone())
            .ack_config(self.ack.clone());
        match &self.tcp {
            Some(tcp) => builder.tcp(tcp.clone()),
            None => builder,
        }
    }

    /// 连接目标的描述（日志 / 提示用）
    pub fn endpoint(&self) -> String {
        match &self.tcp {
            Some(tcp) => format!("tcp://{}", tcp.address()),
            None => format!("{} @ {} baud", self.port, self.baud_rate),
        }
    }
}
