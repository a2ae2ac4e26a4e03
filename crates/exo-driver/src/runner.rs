//! Loop Runner - 固定频率控制循环
//!
//! 按固定频率驱动 [`ControlCycle`]：读取一帧 → 计算 → 下发指令 → 触发钩子。
//!
//! # 核心功能
//!
//! - **精确定时**: 绝对截止时间 + `spin_sleep`，低抖动
//! - **超时统计**: 计算超出周期预算时记录 overrun，落后超过一个周期时重新对齐
//! - **错误容忍**: 读取失败跳过本周期（不下发指令），连续失败达到上限后停止
//! - **安全退出**: 任何退出路径都会尝试下发零电流
//!
//! # 使用场景
//!
//! ```rust,no_run
//! use exo_control::{LegController, SharedProfile};
//! use exo_driver::{LoopConfig, LoopRunner, SimulatedExo};
//! use exo_protocol::LegSide;
//! use exo_tools::ExoConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExoConfig::default();
//! let profile = SharedProfile::from_settings(&config.profile)?;
//! let mut leg = LegController::from_config(&config, "left", profile)?;
//! let mut device = SimulatedExo::new(LegSide::Left);
//!
//! let runner = LoopRunner::new(LoopConfig {
//!     max_cycles: Some(5_000), // 500Hz 下 10 秒
//!     ..LoopConfig::default()
//! })?;
//! let summary = runner.run_leg(&mut leg, &mut device)?;
//! println!("{} cycles, {} overruns", summary.cycles, summary.metrics.overruns);
//! # Ok(())
//! # }
//! ```

use crate::device::ExoDevice;
use crate::error::{DeviceError, RunnerError};
use crate::hooks::{HookManager, SnapshotCallback};
use crate::metrics::{RunnerMetrics, RunnerMetricsSnapshot};
use exo_control::{BilateralController, ControlCycle};
use exo_tools::LoopSettings;
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 控制循环配置
#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    /// 控制频率（Hz），500.0 表示 2ms 周期
    pub frequency_hz: f64,

    /// 最大周期数（None 表示直到停止标志被清除）
    pub max_cycles: Option<u64>,

    /// 连续设备错误达到此值时停止
    pub max_consecutive_errors: u32,

    /// 是否提升控制线程优先级（需要 `realtime` feature）
    pub realtime: bool,

    /// 保留多少个周期耗时样本（预分配，0 表示不保留）
    pub latency_samples: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            frequency_hz: 500.0,
            max_cycles: None,
            max_consecutive_errors: 5,
            realtime: false,
            latency_samples: 0,
        }
    }
}

impl LoopConfig {
    pub fn from_settings(settings: &LoopSettings) -> Self {
        Self {
            frequency_hz: settings.frequency_hz,
            max_consecutive_errors: settings.max_consecutive_errors,
            realtime: settings.realtime,
            ..Self::default()
        }
    }

    /// 标称周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz)
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(RunnerError::Config(format!(
                "Invalid frequency_hz: {} (must be > 0)",
                self.frequency_hz
            )));
        }
        if self.frequency_hz > 10000.0 {
            warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                self.frequency_hz
            );
        }
        if self.max_consecutive_errors == 0 {
            return Err(RunnerError::Config(
                "Invalid max_consecutive_errors: 0 (must be > 0)".to_string(),
            ));
        }
        Ok(())
    }
}

/// 循环正常结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 停止标志被清除
    Stopped,
    /// 达到 `max_cycles`
    MaxCycles,
}

/// 一次运行的汇总
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub cycles: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
    pub metrics: RunnerMetricsSnapshot,
    /// 前 `latency_samples` 个周期的计算耗时（微秒）
    pub latencies_us: Vec<u64>,
}

/// 一个周期内要做的事
trait CycleTask {
    fn tick(&mut self, hooks: &HookManager, metrics: &RunnerMetrics) -> Result<(), DeviceError>;

    /// 退出时下发零电流
    fn shutdown(&mut self);
}

struct LegTask<'a, C, D> {
    controller: &'a mut C,
    device: &'a mut D,
}

impl<C: ControlCycle, D: ExoDevice> CycleTask for LegTask<'_, C, D> {
    fn tick(&mut self, hooks: &HookManager, metrics: &RunnerMetrics) -> Result<(), DeviceError> {
        step_leg(self.controller, self.device, hooks, metrics)
    }

    fn shutdown(&mut self) {
        stop_device(self.device);
    }
}

struct BilateralTask<'a, L, R> {
    controller: &'a mut BilateralController,
    left: &'a mut L,
    right: &'a mut R,
}

impl<L: ExoDevice, R: ExoDevice> CycleTask for BilateralTask<'_, L, R> {
    fn tick(&mut self, hooks: &HookManager, metrics: &RunnerMetrics) -> Result<(), DeviceError> {
        // 两条腿互不影响：一侧失败时另一侧照常更新
        let left = step_leg(&mut self.controller.left, self.left, hooks, metrics);
        let right = step_leg(&mut self.controller.right, self.right, hooks, metrics);
        left.and(right)
    }

    fn shutdown(&mut self) {
        stop_device(self.left);
        stop_device(self.right);
    }
}

fn step_leg<C: ControlCycle, D: ExoDevice>(
    controller: &mut C,
    device: &mut D,
    hooks: &HookManager,
    metrics: &RunnerMetrics,
) -> Result<(), DeviceError> {
    let frame = device.read_frame().inspect_err(|_| {
        metrics.read_errors.fetch_add(1, Ordering::Relaxed);
    })?;

    let snapshot = controller.step(&frame);

    device.command_current(snapshot.command).inspect_err(|_| {
        metrics.write_errors.fetch_add(1, Ordering::Relaxed);
    })?;

    metrics.commands_sent.fetch_add(1, Ordering::Relaxed);
    if snapshot.saturated {
        metrics.saturated_commands.fetch_add(1, Ordering::Relaxed);
    }
    if snapshot.heelstrike {
        metrics.heelstrikes.fetch_add(1, Ordering::Relaxed);
    }

    // 只在指令实际下发后触发
    hooks.trigger_all(&snapshot);
    Ok(())
}

fn stop_device<D: ExoDevice>(device: &mut D) {
    match device.stop() {
        Ok(()) => debug!("{} device stopped with zero current", device.side()),
        Err(e) => warn!("Failed to send zero current to {} device: {}", device.side(), e),
    }
}

fn check_side<C: ControlCycle, D: ExoDevice>(controller: &C, device: &D) -> Result<(), RunnerError> {
    if controller.side() != device.side() {
        return Err(RunnerError::Config(format!(
            "{} controller paired with {} device",
            controller.side(),
            device.side()
        )));
    }
    Ok(())
}

#[cfg(feature = "realtime")]
fn raise_thread_priority() {
    use thread_priority::{ThreadPriority, set_current_thread_priority};

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(()) => {
            info!("Control thread priority set to MAX (realtime)");
        },
        Err(e) => {
            warn!(
                "Failed to set control thread priority: {:?}. \
                On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                e
            );
        },
    }
}

#[cfg(not(feature = "realtime"))]
fn raise_thread_priority() {
    warn!("Realtime priority requested but exo-driver was built without the `realtime` feature");
}

/// 单腿控制循环
///
/// 停止标志在创建时置为运行状态，可通过 [`LoopRunner::stop_flag`] 与其他线程
/// （如 Ctrl+C 处理器）共享。
#[derive(Debug, Clone)]
pub struct LoopRunner {
    config: LoopConfig,
    hooks: HookManager,
    metrics: Arc<RunnerMetrics>,
    running: Arc<AtomicBool>,
}

impl LoopRunner {
    pub fn new(config: LoopConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        Ok(Self {
            config,
            hooks: HookManager::new(),
            metrics: Arc::new(RunnerMetrics::new()),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// 与其他运行器共用同一个停止标志（双线程模式）
    #[must_use]
    pub fn with_stop_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    pub fn add_callback(&mut self, callback: Arc<dyn SnapshotCallback>) {
        self.hooks.add_callback(callback);
    }

    pub fn hooks_mut(&mut self) -> &mut HookManager {
        &mut self.hooks
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<RunnerMetrics> {
        &self.metrics
    }

    /// 停止标志（true 表示继续运行）
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// 请求停止，当前周期结束后生效
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 在当前线程运行单腿循环
    pub fn run_leg<C: ControlCycle, D: ExoDevice>(
        &self,
        controller: &mut C,
        device: &mut D,
    ) -> Result<RunSummary, RunnerError> {
        check_side(controller, device)?;
        info!(
            "Starting {} leg control loop at {} Hz",
            controller.side(),
            self.config.frequency_hz
        );
        self.run(&mut LegTask { controller, device })
    }

    /// 在独立线程运行单腿循环
    ///
    /// 线程名为 `exo-<side>`。
    pub fn spawn_leg<C, D>(
        self,
        mut controller: C,
        mut device: D,
    ) -> Result<JoinHandle<Result<RunSummary, RunnerError>>, RunnerError>
    where
        C: ControlCycle + 'static,
        D: ExoDevice + 'static,
    {
        check_side(&controller, &device)?;
        let handle = thread::Builder::new()
            .name(format!("exo-{}", controller.side()))
            .spawn(move || self.run_leg(&mut controller, &mut device))?;
        Ok(handle)
    }

    fn run(&self, task: &mut impl CycleTask) -> Result<RunSummary, RunnerError> {
        if self.config.realtime {
            raise_thread_priority();
        }

        let period = self.config.period();
        let sleeper = SpinSleeper::default();
        let mut latencies = Vec::with_capacity(self.config.latency_samples);
        let mut consecutive_errors = 0u32;
        let mut cycles = 0u64;

        let start = Instant::now();
        let mut deadline = start;

        let outcome = loop {
            // Acquire: 看到 false 时也能看到停止方之前的写入
            if !self.running.load(Ordering::Acquire) {
                break Ok(StopReason::Stopped);
            }
            if let Some(max_cycles) = self.config.max_cycles
                && cycles >= max_cycles
            {
                break Ok(StopReason::MaxCycles);
            }

            let cycle_start = Instant::now();
            match task.tick(&self.hooks, &self.metrics) {
                Ok(()) => consecutive_errors = 0,
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(
                        "Device error in cycle {} ({}/{}): {}",
                        cycles, consecutive_errors, self.config.max_consecutive_errors, e
                    );
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        break Err(RunnerError::TooManyErrors {
                            count: consecutive_errors,
                            last: e,
                        });
                    }
                },
            }

            let busy_us = u64::try_from(cycle_start.elapsed().as_micros()).unwrap_or(u64::MAX);
            self.metrics.record_cycle(busy_us);
            if latencies.len() < self.config.latency_samples {
                latencies.push(busy_us);
            }
            cycles += 1;

            deadline += period;
            let now = Instant::now();
            if now < deadline {
                sleeper.sleep(deadline - now);
            } else {
                self.metrics.overruns.fetch_add(1, Ordering::Relaxed);
                // 落后超过一个周期时放弃追赶
                if now - deadline > period {
                    deadline = now;
                }
            }
        };

        task.shutdown();

        let stop_reason = outcome?;
        let summary = RunSummary {
            cycles,
            stop_reason,
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
            latencies_us: latencies,
        };
        info!(
            "Control loop finished ({:?}): {} cycles in {:.2?}, {} overruns",
            summary.stop_reason, summary.cycles, summary.elapsed, summary.metrics.overruns
        );
        Ok(summary)
    }
}

/// 双腿控制循环（同一线程内顺序更新两条腿）
#[derive(Debug, Clone)]
pub struct BilateralRunner {
    runner: LoopRunner,
}

impl BilateralRunner {
    pub fn new(runner: LoopRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &LoopRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut LoopRunner {
        &mut self.runner
    }

    pub fn run<L: ExoDevice, R: ExoDevice>(
        &self,
        controller: &mut BilateralController,
        left: &mut L,
        right: &mut R,
    ) -> Result<RunSummary, RunnerError> {
        check_side(&controller.left, left)?;
        check_side(&controller.right, right)?;
        info!(
            "Starting bilateral control loop at {} Hz",
            self.runner.config.frequency_hz
        );
        self.runner.run(&mut BilateralTask {
            controller,
            left,
            right,
        })
    }
}
