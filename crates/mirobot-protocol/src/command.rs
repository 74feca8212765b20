//! 命令文本构建
//!
//! 每个意图对应一个固定模板，只有数值部分由参数填充。位置数值使用 `f64` 的
//! `Display` 渲染（最短往返表示）：整数值不带小数部分（`260`、`-95`），
//! 非整数值保留原始精度（`17.5`）；位姿中的姿态角固定两位小数（`B-95.00`），
//! 与控制器示例格式一致。本模块不做任何物理范围校验，越界值由控制器自行处理。
//!
//! | 意图 | 文本 |
//! |------|------|
//! | 滑轨回零 | `$H7` |
//! | 机械臂回零 | `$H` |
//! | 滑轨绝对移动 | `G90 G01 D{p} F2000` |
//! | 绝对位姿移动 | `M20 G90 G01 X{x} Y{y} Z{z} A{a:.2} B{b:.2} C{c:.2} F2000.00` |
//! | 单轴相对移动 | `M20 G91 {axis}{delta}` |
//! | 吸盘吸气 | `M3S1000M4E65` |
//! | 吸盘吹气 | `M3S500` |
//! | 吸盘关闭 | `M3S0M4E45` |

use crate::types::{Axis, Pose};
use std::fmt;

/// 默认进给速度（滑轨 / 传送带 / 笛卡尔移动）
pub const DEFAULT_FEED_RATE: u32 = 2000;

/// 协议命令
///
/// 由构建函数一次性生成，创建后不可修改。命令没有身份信息，
/// 唯一的内容就是它的字面文本。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(String);

impl Command {
    /// 滑轨回零（两阶段回零的第一阶段）
    pub fn home_slider() -> Self {
        Self("$H7".to_string())
    }

    /// 机械臂各轴回零（两阶段回零的第二阶段）
    pub fn home_arm() -> Self {
        Self("$H".to_string())
    }

    /// 两阶段回零：先滑轨，再其余各轴
    pub fn home() -> [Self; 2] {
        [Self::home_slider(), Self::home_arm()]
    }

    /// 滑轨绝对移动（默认速度）
    pub fn slider_move_to(position: f64) -> Self {
        Self::slider_move_to_with_feed(position, DEFAULT_FEED_RATE)
    }

    /// 滑轨绝对移动（指定速度）
    pub fn slider_move_to_with_feed(position: f64, feed_rate: u32) -> Self {
        Self(format!("G90 G01 D{} F{}", position, feed_rate))
    }

    /// 传送带相对移动（D 轴增量模式）
    pub fn belt_move(distance: f64, feed_rate: u32) -> Self {
        Self(format!("G91 G01 D{} F{}", distance, feed_rate))
    }

    /// 笛卡尔绝对位姿移动
    pub fn move_to(pose: &Pose) -> Self {
        Self(format!(
            "M20 G90 G01 X{} Y{} Z{} A{:.2} B{:.2} C{:.2} F{}.00",
            pose.x, pose.y, pose.z, pose.a, pose.b, pose.c, DEFAULT_FEED_RATE
        ))
    }

    /// 单轴相对移动
    pub fn move_axis_relative(axis: Axis, delta: f64) -> Self {
        Self(format!("M20 G91 {}{}", axis, delta))
    }

    pub fn suction_on() -> Self {
        Self("M3S1000M4E65".to_string())
    }

    pub fn suction_blow() -> Self {
        Self("M3S500".to_string())
    }

    pub fn suction_off() -> Self {
        Self("M3S0M4E45".to_string())
    }

    /// 状态查询，控制器回复 `<State,...>` 报告
    pub fn status_query() -> Self {
        Self("?".to_string())
    }

    /// 立即停止（feed hold）
    pub fn stop() -> Self {
        Self("!".to_string())
    }

    /// 命令文本
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 命令字节（ASCII）
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
