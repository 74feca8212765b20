//! # Mirobot Vision
//!
//! 取放工位的颜色识别：在相机画面的固定区域内寻找红 / 绿 / 蓝色块，
//! 把识别结果以一行文本（`Red` / `Green` / `Blue`）经串口报告给机械臂主机。
//!
//! - `frame`: 帧、像素、区域（RGB565 / RGB888 解码）
//! - `color`: 颜色标签、LAB 阈值、RGB → LAB 转换
//! - `classifier`: 步长播种 + 洪水填充的色块搜索，最大色块胜出
//! - `report`: 发送端 `ColorReporter` 与接收端 `ColorReceiver`
//! - `config`: `[vision]` 配置段

pub mod classifier;
pub mod color;
pub mod config;
mod error;
pub mod frame;
pub mod report;

pub use classifier::{Blob, Classifier};
pub use color::{ColorLabel, ColorThresholds, Lab, LabThreshold};
pub use config::VisionConfig;
pub use error::VisionError;
pub use frame::{Frame, Region, Rgb};
pub use report::{ColorReceiver, ColorReporter};
