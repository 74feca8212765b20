//! 配置管理命令

use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::app_config::{AppConfig, default_config_path};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置
    Show,

    /// 写入一份默认配置文件
    Init {
        /// 目标路径（默认为用户配置目录）
        path: Option<PathBuf>,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 打印默认配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(&self, config: &AppConfig, source: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                match source {
                    Some(path) => println!("# 来源: {}", path.display()),
                    None => println!("# 来源: 内置默认值"),
                }
                print!("{}", config.to_toml()?);
            },

            ConfigCommand::Init { path, force } => {
                let path = match path {
                    Some(path) => path.clone(),
                    None => default_config_path()?,
                };
                if path.exists() && !force {
                    anyhow::bail!("{} 已存在（使用 --force 覆盖）", path.display());
                }
                AppConfig::default().save(&path)?;
                println!("✅ 已写入 {}", path.display());
            },

            ConfigCommand::Path => {
                println!("{}", default_config_path()?.display());
            },
        }
        Ok(())
    }
}
