//! 颜色识别命令
//!
//! `classify` 在相机端运行：识别一帧原始图像并（可选）经报告串口发送结果。
//! `receive` 在机械臂主机端运行：等待一条颜色报告。

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use mirobot_serial::SerialPortTransport;
use mirobot_vision::{Classifier, ColorReceiver, ColorReporter, Frame};
use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::AppConfig;
use crate::validation::validate_input_file;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 大端 RGB565（相机原始格式）
    Rgb565,
    Rgb888,
}

#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// 原始帧文件
    #[arg(short, long)]
    pub frame: PathBuf,

    #[arg(long, default_value_t = 320)]
    pub width: usize,

    #[arg(long, default_value_t = 240)]
    pub height: usize,

    #[arg(long, value_enum, default_value_t = PixelFormat::Rgb565)]
    pub format: PixelFormat,

    /// 经报告串口发送识别结果
    #[arg(long)]
    pub report: bool,
}

impl ClassifyCommand {
    pub fn load_frame(&self) -> Result<Frame> {
        validate_input_file(&self.frame)?;
        let bytes = std::fs::read(&self.frame)
            .with_context(|| format!("读取帧文件失败: {}", self.frame.display()))?;
        let frame = match self.format {
            PixelFormat::Rgb565 => Frame::from_rgb565(&bytes, self.width, self.height)?,
            PixelFormat::Rgb888 => Frame::from_rgb888(&bytes, self.width, self.height)?,
        };
        Ok(frame)
    }

    pub fn execute(&self, config: &AppConfig) -> Result<()> {
        let frame = self.load_frame()?;
        let classifier = Classifier::from_config(&config.vision);
        let label = classifier.classify(&frame);

        match label {
            Some(label) => println!("🎨 识别结果: {}", label),
            None => println!("(区域内没有识别到颜色)"),
        }

        if self.report {
            let serial = config.vision.serial_config();
            let transport = SerialPortTransport::open(&serial)
                .with_context(|| format!("无法打开报告串口 {}", serial.port))?;
            let mut reporter = ColorReporter::new(transport);
            if reporter.report(label)? {
                println!("📤 已发送到 {}", serial.port);
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ReceiveCommand {
    /// 等待时间（毫秒）
    #[arg(short, long, default_value_t = 30_000)]
    pub timeout_ms: u64,
}

impl ReceiveCommand {
    pub fn execute(&self, config: &AppConfig) -> Result<()> {
        let serial = config.vision.serial_config();
        let transport = SerialPortTransport::open(&serial)
            .with_context(|| format!("无法打开报告串口 {}", serial.port))?;
        let mut receiver = ColorReceiver::new(transport, serial.read_timeout());

        println!("⏳ 等待颜色报告 ({}) ...", serial.port);
        let label = receiver.receive(Duration::from_millis(self.timeout_ms))?;
        println!("🎨 {}", label);
        Ok(())
    }
}
