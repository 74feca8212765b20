//! `[vision]` 配置段

use crate::classifier::{DEFAULT_PIXELS_THRESHOLD, DEFAULT_STRIDE};
use crate::color::ColorThresholds;
use crate::frame::Region;
use mirobot_serial::SerialConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// 颜色报告串口
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub stride: usize,
    pub pixels_threshold: usize,
    pub region: Region,
    pub thresholds: ColorThresholds,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: SerialConfig::REPORT_BAUD_RATE,
            read_timeout_ms: 1000,
            stride: DEFAULT_STRIDE,
            pixels_threshold: DEFAULT_PIXELS_THRESHOLD,
            region: Region::default(),
            thresholds: ColorThresholds::default(),
        }
    }
}

impl VisionConfig {
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            read_timeout_ms: self.read_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VisionConfig::default();
        assert_eq!(config.baud_rate, 19_200);
        assert_eq!(config.region, Region::new(145, 145, 70, 70));
        assert_eq!(config.stride, 10);
        assert_eq!(config.pixels_threshold, 50);
    }

    #[test]
    fn test_partial_toml() {
        let config: VisionConfig = toml::from_str(
            r#"
            port = "/dev/ttyS3"
            region = { x = 100, y = 80, width = 120, height = 60 }
            pixels_threshold = 80
            "#,
        )
        .unwrap();
        assert_eq!(config.port, "/dev/ttyS3");
        assert_eq!(config.region, Region::new(100, 80, 120, 60));
        assert_eq!(config.pixels_threshold, 80);
        assert_eq!(config.stride, 10);
        assert_eq!(config.serial_config().baud_rate, 19_200);
    }
}
