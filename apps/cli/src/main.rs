//! # Mirobot CLI
//!
//! Command-line interface for Mirobot arm control and colour reporting.
//!
//! 每个命令独立执行（读取配置 → 连接 → 执行 → 断开）：
//!
//! ```bash
//! # 写入默认配置后按需修改串口
//! mirobot-cli config init
//!
//! # 执行内置取放演示 / 序列文件
//! mirobot-cli run
//! mirobot-cli run --sequence sequences/pick_and_place.toml
//!
//! # 单条命令
//! mirobot-cli home
//! mirobot-cli jog X -50
//! mirobot-cli suction on
//!
//! # 相机端：识别一帧并报告
//! mirobot-cli classify --frame frame.raw --report
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod app_config;
mod commands;
mod session;
mod validation;

use app_config::AppConfig;
use commands::{
    ClassifyCommand, ConfigCommand, JogCommand, LinearCommand, MoveToCommand, ReceiveCommand,
    RunCommand, SequenceCommand, SuctionAction, motion,
};

/// Mirobot CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "mirobot-cli")]
#[command(about = "Command-line interface for Mirobot arm control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认 <config_dir>/mirobot/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 机械臂串口（覆盖配置）
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// 机械臂波特率（覆盖配置）
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 执行序列
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 序列文件工具
    #[command(subcommand)]
    Sequence(SequenceCommand),

    /// 回零（滑轨 + 机械臂）
    Home,

    /// 绝对位姿移动
    MoveTo {
        #[command(flatten)]
        args: MoveToCommand,
    },

    /// 单轴相对移动
    Jog {
        #[command(flatten)]
        args: JogCommand,
    },

    /// 滑轨绝对移动
    Slider {
        #[command(flatten)]
        args: LinearCommand,
    },

    /// 传送带相对移动
    Belt {
        #[command(flatten)]
        args: LinearCommand,
    },

    /// 吸盘控制
    Suction {
        #[arg(value_enum)]
        action: SuctionAction,
    },

    /// 查询机械臂状态
    Status,

    /// 急停
    Stop,

    /// 识别一帧图像中的颜色
    Classify {
        #[command(flatten)]
        args: ClassifyCommand,
    },

    /// 等待一条颜色报告
    Receive {
        #[command(flatten)]
        args: ReceiveCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mirobot_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let (config, source) = AppConfig::load(cli.config.as_deref())?;
    let config = config.with_arm_overrides(cli.port.as_deref(), cli.baud);

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config, source.as_deref()),
        Commands::Run { args } => args.execute(&config),
        Commands::Sequence(cmd) => cmd.execute(),
        Commands::Home => motion::home(&config),
        Commands::MoveTo { args } => motion::move_to(&config, &args),
        Commands::Jog { args } => motion::jog(&config, &args),
        Commands::Slider { args } => motion::slider(&config, &args),
        Commands::Belt { args } => motion::belt(&config, &args),
        Commands::Suction { action } => motion::suction(&config, action),
        Commands::Status => motion::status(&config),
        Commands::Stop => motion::stop(&config),
        Commands::Classify { args } => args.execute(&config),
        Commands::Receive { args } => args.execute(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use mirobot_protocol::Axis;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_jog_with_negative_delta() {
        let cli = Cli::try_parse_from(["mirobot-cli", "jog", "X", "-50"]).unwrap();
        match cli.command {
            Commands::Jog { args } => {
                assert_eq!(args.axis, Axis::X);
                assert_eq!(args.delta, -50.0);
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_axis() {
        assert!(Cli::try_parse_from(["mirobot-cli", "jog", "Q", "1"]).is_err());
    }

    #[test]
    fn test_parse_global_port_override() {
        let cli = Cli::try_parse_from(["mirobot-cli", "home", "--port", "/dev/ttyUSB3"]).unwrap();
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB3"));
        assert!(matches!(cli.command, Commands::Home));
    }

    #[test]
    fn test_parse_suction_action() {
        let cli = Cli::try_parse_from(["mirobot-cli", "suction", "blow"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Suction {
                action: SuctionAction::Blow
            }
        ));
    }
}
