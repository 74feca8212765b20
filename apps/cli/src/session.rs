//! 单次连接会话
//!
//! 每个命令独立执行：读取配置 → 打开连接（串口或 TCP 转发器）→ 执行操作 → 关闭连接。
//! Ctrl-C 设置共享的取消令牌，正在等待的命令以 `Cancelled` 结束，随后会话
//! 在同一连接上发送停止命令（`!`），让机械臂停下而不是继续运动。

use crate::app_config::AppConfig;
use anyhow::{Context, Result};
use mirobot_driver::{ArmController, CancelToken, DriverError, Transport};
use tracing::warn;

pub struct Session<T: Transport = Box<dyn Transport>> {
    pub arm: ArmController<T>,
    pub cancel: CancelToken,
}

impl Session {
    /// 按配置打开机械臂连接
    pub fn connect(config: &AppConfig) -> Result<Self> {
        let cancel = CancelToken::new();
        install_ctrlc(&cancel)?;

        let endpoint = config.arm.endpoint();
        println!("⏳ 连接机械臂: {}", endpoint);
        let arm = config
            .arm
            .builder()
            .cancel_token(cancel.clone())
            .connect()
            .with_context(|| format!("无法连接机械臂 {}", endpoint))?;
        println!("✅ 已连接");

        Ok(Self { arm, cancel })
    }
}

impl<T: Transport> Session<T> {
    pub fn new(arm: ArmController<T>) -> Self {
        let cancel = arm.cancel_token();
        Self { arm, cancel }
    }

    /// 执行一个机械臂操作；被取消时发送停止命令
    pub fn perform<R>(
        &mut self,
        op: impl FnOnce(&mut ArmController<T>) -> Result<R, DriverError>,
    ) -> Result<R> {
        let result = op(&mut self.arm);
        if let Err(err @ DriverError::Cancelled { .. }) = &result {
            warn!("{}", err);
            self.halt();
        }
        Ok(result?)
    }

    /// 发送停止命令（失败只记录，不覆盖原始错误）
    pub fn halt(&mut self) {
        println!("🛑 已取消，发送停止命令");
        if let Err(e) = self.arm.stop() {
            warn!("Failed to send stop command: {}", e);
        }
    }
}

fn install_ctrlc(cancel: &CancelToken) -> Result<()> {
    let token = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("Ctrl-C received, cancelling");
        token.cancel();
    })
    .context("设置 Ctrl-C 处理器失败")
}
