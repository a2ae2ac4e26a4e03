//! 模拟运行命令
//!
//! 两台 [`SimulatedExo`] 按合成步态波形产生数据，双腿控制循环在当前线程运行，
//! 结束后打印循环延迟与步幅统计。

use anyhow::{Context, Result, bail};
use clap::Args;
use exo_sdk::driver::{GaitWaveform, RunSummary, StopReason};
use exo_sdk::prelude::*;
use exo_sdk::tools::statistics::{LatencyStatistics, StrideStatistics};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// 模拟命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 模拟时长（秒，设备时间）
    #[arg(short, long, default_value_t = 10.0)]
    pub duration: f64,

    /// 墙钟加速倍数（控制频率 × speed）
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// 步幅周期（毫秒）
    #[arg(long, default_value_t = 1000)]
    pub stride_ms: u64,

    /// 支撑相占比
    #[arg(long, default_value_t = 0.6)]
    pub stance_fraction: f64,

    /// 陀螺仪均匀噪声幅值（rad/s）
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// 噪声随机种子
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// 快照输出文件（JSON Lines）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 以 JSON 输出运行摘要
    #[arg(long)]
    pub json: bool,
}

impl SimulateCommand {
    pub fn execute(&self, config: &ExoConfig) -> Result<()> {
        if !(self.duration > 0.0 && self.duration.is_finite()) {
            bail!("--duration must be > 0, got {}", self.duration);
        }
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            bail!("--speed must be > 0, got {}", self.speed);
        }

        let frequency_hz = config.control_loop.frequency_hz;
        let sample_ms = ((1000.0 / frequency_hz).round() as u64).max(1);
        let cycles = ((self.duration * 1000.0) / sample_ms as f64).ceil() as u64;

        let waveform = GaitWaveform {
            stride_ms: self.stride_ms,
            stance_fraction: self.stance_fraction,
            ..GaitWaveform::default()
        };
        let device = |side: LegSide| {
            SimulatedExo::new(side)
                .with_waveform(waveform.clone())
                .with_sample_period(sample_ms)
                .with_gyro_noise(self.noise, self.seed ^ side as u64)
        };
        let mut left = device(LegSide::Left);
        let mut right = device(LegSide::Right);

        let profile = SharedProfile::from_settings(&config.profile).context("构建力矩曲线失败")?;
        let mut legs = BilateralController::from_config(config, profile)?;

        let loop_config = LoopConfig {
            frequency_hz: frequency_hz * self.speed,
            max_cycles: Some(cycles),
            max_consecutive_errors: config.control_loop.max_consecutive_errors,
            realtime: config.control_loop.realtime,
            latency_samples: cycles.min(1_000_000) as usize,
        };
        let mut runner = LoopRunner::new(loop_config)?;

        // Ctrl-C 清除运行标志，循环在下一周期退出并下发零电流
        let running = runner.stop_flag();
        ctrlc::set_handler(move || {
            running.store(false, std::sync::atomic::Ordering::Release);
        })
        .context("注册 Ctrl-C 处理器失败")?;

        let writer = match &self.output {
            Some(path) => {
                let (recorder, rx) = SnapshotRecorder::new(config.control_loop.recording_capacity);
                let recorder = Arc::new(recorder);
                runner.add_callback(recorder.clone());
                let file = File::create(path)
                    .with_context(|| format!("创建输出文件失败: {}", path.display()))?;
                let handle = thread::Builder::new()
                    .name("exo-recorder".to_string())
                    .spawn(move || -> Result<u64> {
                        let mut out = BufWriter::new(file);
                        let mut written = 0;
                        for snapshot in rx {
                            serde_json::to_writer(&mut out, &snapshot)?;
                            out.write_all(b"\n")?;
                            written += 1;
                        }
                        out.flush()?;
                        Ok(written)
                    })?;
                Some((recorder, handle))
            },
            None => None,
        };

        info!(
            "Simulating {:.1} s ({} cycles at {} Hz, speed x{})",
            self.duration, cycles, frequency_hz, self.speed
        );
        let runner = BilateralRunner::new(runner);
        let result = runner.run(&mut legs, &mut left, &mut right);
        // 释放回调中的发送端，录制线程随之退出
        drop(runner);

        let recorded = match writer {
            Some((recorder, handle)) => {
                let dropped = recorder.dropped_count();
                drop(recorder);
                let written = handle
                    .join()
                    .map_err(|_| anyhow::anyhow!("recorder thread panicked"))??;
                if dropped > 0 {
                    warn!("{} snapshots dropped (recording queue full)", dropped);
                }
                Some((written, dropped))
            },
            None => None,
        };

        let summary = result?;
        let report = SimulationReport::new(&summary, &legs, sample_ms, recorded);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            report.print();
        }
        Ok(())
    }
}

/// 单腿步态结果
#[derive(Debug, serde::Serialize)]
struct LegReport {
    side: LegSide,
    heelstrikes: u64,
    spurious_heelstrikes: u64,
    rejected_strides: u64,
    expected_stride_ms: Option<f64>,
    expected_stance_ms: Option<f64>,
    strides: Option<StrideStatistics>,
}

impl LegReport {
    fn new(leg: &LegController) -> Self {
        let estimator = leg.estimator();
        let counters = estimator.counters();
        let history: Vec<f64> = estimator
            .state()
            .stride_history()
            .history()
            .map(|d| d as f64)
            .collect();
        Self {
            side: leg.side(),
            heelstrikes: counters.heelstrikes,
            spurious_heelstrikes: counters.spurious_heelstrikes,
            rejected_strides: counters.rejected_strides,
            expected_stride_ms: estimator.expected_stride_ms(),
            expected_stance_ms: estimator.expected_stance_ms(),
            strides: StrideStatistics::calculate(&history),
        }
    }
}

/// 模拟运行摘要
#[derive(Debug, serde::Serialize)]
struct SimulationReport {
    cycles: u64,
    completed: bool,
    simulated_ms: u64,
    elapsed_ms: f64,
    commands_sent: u64,
    saturated_commands: u64,
    overruns: u64,
    latency: LatencyStatistics,
    legs: [LegReport; 2],
    snapshots_written: Option<u64>,
    snapshots_dropped: Option<u64>,
}

impl SimulationReport {
    fn new(
        summary: &RunSummary,
        legs: &BilateralController,
        sample_ms: u64,
        recorded: Option<(u64, u64)>,
    ) -> Self {
        Self {
            cycles: summary.cycles,
            completed: summary.stop_reason == StopReason::MaxCycles,
            simulated_ms: summary.cycles * sample_ms,
            elapsed_ms: summary.elapsed.as_secs_f64() * 1000.0,
            commands_sent: summary.metrics.commands_sent,
            saturated_commands: summary.metrics.saturated_commands,
            overruns: summary.metrics.overruns,
            latency: LatencyStatistics::calculate(&summary.latencies_us),
            legs: [LegReport::new(&legs.left), LegReport::new(&legs.right)],
            snapshots_written: recorded.map(|(written, _)| written),
            snapshots_dropped: recorded.map(|(_, dropped)| dropped),
        }
    }

    fn print(&self) {
        let status = if self.completed { "✅" } else { "⏹️ " };
        println!(
            "{} {} cycles ({} ms simulated, {:.1} ms wall)",
            status, self.cycles, self.simulated_ms, self.elapsed_ms
        );
        println!(
            "   commands: {} sent, {} saturated, {} overruns",
            self.commands_sent, self.saturated_commands, self.overruns
        );
        println!(
            "   cycle latency: avg {:.1} us, p99 {:.1} us, max {} us",
            self.latency.avg_latency_us, self.latency.p99_latency_us, self.latency.max_latency_us
        );

        for leg in &self.legs {
            println!(
                "   {}: {} heelstrikes ({} spurious, {} rejected strides)",
                leg.side, leg.heelstrikes, leg.spurious_heelstrikes, leg.rejected_strides
            );
            match (&leg.strides, leg.expected_stance_ms) {
                (Some(s), stance) => println!(
                    "      stride {:.1} ± {:.1} ms, cadence {:.1}/min, stance {}",
                    s.mean_ms,
                    s.std_dev_ms,
                    s.cadence_per_min,
                    stance.map_or_else(|| "-".to_string(), |ms| format!("{ms:.1} ms"))
                ),
                (None, _) => println!("      no stride timebase yet"),
            }
        }

        if let Some(written) = self.snapshots_written {
            println!(
                "   snapshots: {} written, {} dropped",
                written,
                self.snapshots_dropped.unwrap_or(0)
            );
        }
    }
}
