//! 单条运动 / 末端执行器命令
//!
//! 每条命令打开串口、发送并等待确认后退出。

use anyhow::Result;
use clap::{Args, ValueEnum};
use mirobot_protocol::{Axis, DEFAULT_FEED_RATE, Pose};

use crate::app_config::AppConfig;
use crate::session::Session;
use crate::validation::{validate_finite, validate_pose};

/// 绝对位姿移动
#[derive(Args, Debug)]
pub struct MoveToCommand {
    #[arg(allow_negative_numbers = true)]
    pub x: f64,
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
    #[arg(allow_negative_numbers = true)]
    pub z: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub a: f64,

    #[arg(long, default_value_t = -95.0, allow_negative_numbers = true)]
    pub b: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub c: f64,
}

impl MoveToCommand {
    pub fn pose(&self) -> Pose {
        Pose::new(self.x, self.y, self.z, self.a, self.b, self.c)
    }
}

/// 单轴相对移动
#[derive(Args, Debug)]
pub struct JogCommand {
    /// 轴（X Y Z A B C D）
    pub axis: Axis,

    /// 位移（mm 或度）
    #[arg(allow_negative_numbers = true)]
    pub delta: f64,
}

/// 滑轨 / 传送带移动
#[derive(Args, Debug)]
pub struct LinearCommand {
    /// 滑轨为绝对位置，传送带为相对距离
    #[arg(allow_negative_numbers = true)]
    pub value: f64,

    /// 进给速度
    #[arg(short, long, default_value_t = DEFAULT_FEED_RATE)]
    pub feed: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuctionAction {
    On,
    Blow,
    Off,
}

pub fn home(config: &AppConfig) -> Result<()> {
    let mut session = Session::connect(config)?;
    println!("🏠 回零（滑轨 → 机械臂）...");
    session.perform(|arm| arm.home())?;
    println!("✅ 回零完成");
    Ok(())
}

pub fn move_to(config: &AppConfig, args: &MoveToCommand) -> Result<()> {
    let pose = args.pose();
    validate_pose(&pose)?;

    let mut session = Session::connect(config)?;
    println!(
        "🎯 移动到 X{} Y{} Z{} A{} B{} C{}",
        pose.x, pose.y, pose.z, pose.a, pose.b, pose.c
    );
    session.perform(|arm| arm.move_to(&pose))?;
    println!("✅ 到位");
    Ok(())
}

pub fn jog(config: &AppConfig, args: &JogCommand) -> Result<()> {
    let delta = validate_finite("delta", args.delta)?;

    let mut session = Session::connect(config)?;
    println!("↔️  {} 轴相对移动 {}", args.axis, delta);
    session.perform(|arm| arm.move_axis_relative(args.axis, delta))?;
    println!("✅ 到位");
    Ok(())
}

pub fn slider(config: &AppConfig, args: &LinearCommand) -> Result<()> {
    let position = validate_finite("position", args.value)?;

    let mut session = Session::connect(config)?;
    println!("🛤️  滑轨移动到 {} (F{})", position, args.feed);
    session.perform(|arm| arm.slider_move_to_with_feed(position, args.feed))?;
    println!("✅ 到位");
    Ok(())
}

pub fn belt(config: &AppConfig, args: &LinearCommand) -> Result<()> {
    let distance = validate_finite("distance", args.value)?;

    let mut session = Session::connect(config)?;
    println!("📦 传送带移动 {} (F{})", distance, args.feed);
    session.perform(|arm| arm.belt_move(distance, args.feed))?;
    println!("✅ 完成");
    Ok(())
}

pub fn suction(config: &AppConfig, action: SuctionAction) -> Result<()> {
    let mut session = Session::connect(config)?;
    session.perform(|arm| match action {
        SuctionAction::On => arm.suction_on(),
        SuctionAction::Blow => arm.suction_blow(),
        SuctionAction::Off => arm.suction_off(),
    })?;
    println!("✅ 吸盘: {:?}", action);
    Ok(())
}

pub fn status(config: &AppConfig) -> Result<()> {
    let mut session = Session::connect(config)?;
    let status = session.perform(|arm| arm.query_status())?;

    println!("状态: {:?}", status.state);
    let j = &status.angle;
    println!(
        "关节角度: A={:.2} B={:.2} C={:.2} D={:.2} X={:.2} Y={:.2} Z={:.2}",
        j.a, j.b, j.c, j.d, j.x, j.y, j.z
    );
    let p = &status.cartesian;
    println!(
        "笛卡尔坐标: X={:.2} Y={:.2} Z={:.2} Rx={:.2} Ry={:.2} Rz={:.2}",
        p.x, p.y, p.z, p.rx, p.ry, p.rz
    );
    Ok(())
}

/// 急停：只写入，不等待确认
///
/// 另一个进程独占串口时无法打开；正在执行的 `run` 用 Ctrl-C 停止。
pub fn stop(config: &AppConfig) -> Result<()> {
    let mut session = Session::connect(config)?;
    println!("🛑 发送急停命令...");
    session.arm.stop()?;
    println!("✅ 急停已发送");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_to_defaults_match_pick_orientation() {
        let cmd = MoveToCommand {
            x: 260.0,
            y: 0.0,
            z: 55.0,
            a: 0.0,
            b: -95.0,
            c: 0.0,
        };
        assert_eq!(cmd.pose(), Pose::from_position(260.0, 0.0, 55.0));
    }
}
