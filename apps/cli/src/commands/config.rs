//! 配置管理命令

use crate::utils::{load_config, resolve_config_path};
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use exo_sdk::ExoConfig;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置文件
    Init {
        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 打印生效的配置（TOML）
    Show,

    /// 打印配置文件路径
    Path,

    /// 校验配置文件
    Check,
}

impl ConfigCommand {
    pub fn execute(self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Init { force } => Self::init_(explicit, force),

            ConfigCommand::Show => {
                let config = load_config(explicit)?;
                print!("{}", config.to_toml_string()?);
                Ok(())
            },

            ConfigCommand::Path => {
                println!("{}", resolve_config_path(explicit)?.display());
                Ok(())
            },

            ConfigCommand::Check => Self::check_(explicit),
        }
    }

    fn init_(explicit: Option<&Path>, force: bool) -> Result<()> {
        let path = resolve_config_path(explicit)?;
        if path.exists() && !force {
            bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        ExoConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn check_(explicit: Option<&Path>) -> Result<()> {
        let path = resolve_config_path(explicit)?;
        let config = load_config(explicit)?;

        // 曲线参数缺失只在构建曲线时报告
        exo_sdk::Profile::from_settings(&config.profile).context("力矩曲线参数无效")?;

        println!("配置文件: {}", path.display());
        println!("  曲线: {}", config.profile.kind());
        println!("  控制频率: {} Hz", config.control_loop.frequency_hz);
        for (id, device) in &config.devices {
            println!(
                "  设备 {}: {} 腿, 电流限制 {} A",
                id,
                device.side,
                config.effective_current_limit(device)
            );
        }
        println!("✅ 配置有效");
        Ok(())
    }
}
