//! # Exo CLI
//!
//! 踝关节外骨骼控制核心的命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! exo-cli config init
//!
//! # 用模拟设备走 30 s（墙钟加速 10 倍），快照写入 JSON Lines
//! exo-cli simulate --duration 30 --speed 10 --output walk.jsonl
//!
//! # 打印当前力矩曲线
//! exo-cli profile --steps 20
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod utils;

use commands::{ConfigCommand, ProfileCommand, SimulateCommand};

/// Exo CLI - 外骨骼控制命令行工具
#[derive(Parser, Debug)]
#[command(name = "exo-cli")]
#[command(about = "Command-line interface for ankle exoskeleton torque control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/exo/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 用模拟设备运行双腿控制循环
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },

    /// 打印力矩曲线采样表
    Profile {
        #[command(flatten)]
        args: ProfileCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("exo_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(config_path),

        Commands::Simulate { args } => {
            let config = utils::load_config(config_path)?;
            args.execute(&config)
        },

        Commands::Profile { args } => {
            let config = utils::load_config(config_path)?;
            args.execute(&config)
        },
    }
}
