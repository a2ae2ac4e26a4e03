//! 力矩曲线命令
//!
//! 按配置构建曲线并打印采样表。

use anyhow::{Context, Result};
use clap::Args;
use exo_sdk::control::profile::PhaseSource;
use exo_sdk::{ExoConfig, Profile};

/// 曲线命令参数
#[derive(Args, Debug)]
pub struct ProfileCommand {
    /// 采样区间起点（相位 % 或关节角 rad）
    #[arg(long)]
    pub from: Option<f64>,

    /// 采样区间终点
    #[arg(long)]
    pub to: Option<f64>,

    /// 采样步数
    #[arg(short, long, default_value_t = 20)]
    pub steps: usize,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl ProfileCommand {
    pub fn execute(&self, config: &ExoConfig) -> Result<()> {
        let profile = Profile::from_settings(&config.profile).context("构建力矩曲线失败")?;
        let (default_from, default_to) = default_range(&profile);
        let from = self.from.unwrap_or(default_from);
        let to = self.to.unwrap_or(default_to);

        let samples = profile.sample_curve(from, to, self.steps);

        if self.json {
            let rows: Vec<serde_json::Value> = samples
                .iter()
                .map(|(x, torque)| serde_json::json!({ "x": x, "torque_nm": torque.0 }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        println!("{} profile", profile.name());
        println!("{:>10}  {:>10}", axis_label(&profile), "torque_nm");
        for (x, torque) in samples {
            println!("{:>10.3}  {:>10.4}", x, torque.0);
        }
        Ok(())
    }
}

fn default_range(profile: &Profile) -> (f64, f64) {
    match profile {
        Profile::Spring(_) => (-0.5, 0.5),
        _ => (0.0, 100.0),
    }
}

fn axis_label(profile: &Profile) -> &'static str {
    match profile {
        Profile::Spring(_) => "angle_rad",
        Profile::Spline(p) if p.source() == PhaseSource::PercentStance => "stance_%",
        _ => "gait_%",
    }
}
