//! run 命令
//!
//! 执行序列文件；未给出文件时执行内置取放演示

use anyhow::Result;
use clap::Args;
use mirobot_control::{Sequence, Sequencer};
use mirobot_driver::DriverError;
use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::session::Session;
use crate::validation::validate_input_file;

#[derive(Args, Debug)]
pub struct RunCommand {
    /// 序列文件（.toml / .json），省略时执行内置演示
    #[arg(short, long)]
    pub sequence: Option<PathBuf>,

    /// 只打印步骤，不连接机械臂
    #[arg(long)]
    pub dry_run: bool,
}

impl RunCommand {
    pub fn load_sequence(&self) -> Result<Sequence> {
        match &self.sequence {
            Some(path) => {
                validate_input_file(path)?;
                println!("📜 加载序列: {}", path.display());
                Ok(Sequence::load(path)?)
            },
            None => Ok(Sequence::pick_and_place_demo()),
        }
    }

    pub fn execute(&self, config: &AppConfig) -> Result<()> {
        let sequence = self.load_sequence()?;

        println!("📋 序列: {}", sequence.name);
        if !sequence.description.is_empty() {
            println!("    {}", sequence.description);
        }
        println!("    {} 个步骤", sequence.len());

        if self.dry_run {
            for (index, step) in sequence.steps.iter().enumerate() {
                println!("  {:>2}. {}", index + 1, step);
            }
            return Ok(());
        }
        println!();

        let mut session = Session::connect(config)?;
        let sequencer = Sequencer::new().with_cancel_token(session.cancel.clone());

        match sequencer.run(&mut session.arm, &sequence) {
            Ok(report) => {
                println!();
                println!("✅ 完成 {} 个步骤，耗时 {:.2} 秒", report.steps_completed, report.duration.as_secs_f64());
                Ok(())
            },
            Err(err) => {
                if matches!(err.source, DriverError::Cancelled { .. }) {
                    session.halt();
                }
                println!();
                println!("❌ 第 {} 步失败: {}", err.step_index + 1, err.step);
                println!(
                    "   最后确认的命令: {}",
                    err.last_acknowledged.as_deref().unwrap_or("(无)")
                );
                if err.arm_state_unknown() {
                    println!("⚠️  机械臂状态未知，请人工确认后再继续");
                }
                Err(err.into())
            },
        }
    }
}
