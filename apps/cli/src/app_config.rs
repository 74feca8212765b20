//! 应用配置
//!
//! 查找顺序：`--config <file>` → `<config_dir>/mirobot/config.toml` → 内置默认值。
//! 缺失的段落和字段使用默认值。

use anyhow::{Context, Result};
use mirobot_control::ArmSettings;
use mirobot_vision::VisionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub arm: ArmSettings,
    pub vision: VisionConfig,
}

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("mirobot");
    path.push("config.toml");
    Ok(path)
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("解析配置文件失败")
    }

    /// 加载配置
    ///
    /// 显式给出的路径必须存在；默认路径不存在时返回默认配置。
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("配置文件不存在: {}", path.display());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok((Self::default(), None));
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("配置文件无效: {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok((config, Some(path)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置失败")
    }

    /// 写入配置文件（自动创建目录）
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))
    }

    /// 命令行参数覆盖机械臂串口设置
    ///
    /// 显式给出 `--port` 时改用本地串口，忽略配置文件中的 `[arm.tcp]`。
    pub fn with_arm_overrides(mut self, port: Option<&str>, baud_rate: Option<u32>) -> Self {
        if let Some(port) = port {
            self.arm.port = port.to_string();
            self.arm.tcp = None;
        }
        if let Some(baud_rate) = baud_rate {
            self.arm.baud_rate = baud_rate;
        }
        self
    }
}
