//! 输入验证
//!
//! 协议层不做物理范围检查，这里只拒绝无法写成 G-code 数字的输入。

use anyhow::{Context, Result};
use mirobot_protocol::Pose;
use std::path::Path;

/// 拒绝 NaN / 无穷大
pub fn validate_finite(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        anyhow::bail!("{} 必须是有限数值，得到 {}", name, value);
    }
    Ok(value)
}

pub fn validate_pose(pose: &Pose) -> Result<()> {
    for (name, value) in [
        ("X", pose.x),
        ("Y", pose.y),
        ("Z", pose.z),
        ("A", pose.a),
        ("B", pose.b),
        ("C", pose.c),
    ] {
        validate_finite(name, value)?;
    }
    Ok(())
}

/// 检查输入文件存在且是普通文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path).with_context(|| format!("文件不存在: {}", path.display()))?;
    if !meta.is_file() {
        anyhow::bail!("不是文件: {}", path.display());
    }
    Ok(())
}
