//! 序列文件工具

use anyhow::Result;
use clap::Subcommand;
use mirobot_control::Sequence;
use std::path::PathBuf;

use crate::validation::validate_input_file;

#[derive(Subcommand, Debug)]
pub enum SequenceCommand {
    /// 将内置取放演示写入文件（.toml / .json）
    Export { path: PathBuf },

    /// 检查序列文件并列出步骤
    Check { path: PathBuf },
}

impl SequenceCommand {
    pub fn execute(&self) -> Result<()> {
        match self {
            SequenceCommand::Export { path } => {
                Sequence::pick_and_place_demo().save(path)?;
                println!("✅ 已写入 {}", path.display());
            },
            SequenceCommand::Check { path } => {
                validate_input_file(path)?;
                let sequence = Sequence::load(path)?;
                println!("📋 {} ({} 个步骤)", sequence.name, sequence.len());
                for (index, step) in sequence.steps.iter().enumerate() {
                    println!("  {:>2}. {}", index + 1, step);
                }
            },
        }
        Ok(())
    }
}
