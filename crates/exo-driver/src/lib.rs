//! # Exo Driver
//!
//! 外骨骼设备边界与控制循环：
//!
//! - [`ExoDevice`]：每周期读取一帧、下发一条电流指令的设备接口
//! - [`SimulatedExo`]：合成步态波形的模拟设备
//! - [`LoopRunner`] / [`BilateralRunner`]：固定频率控制循环（`spin_sleep` 定时）
//! - 钩子系统：[`HookManager`] + [`SnapshotRecorder`]，周期快照经有界通道异步录制
//! - [`RunnerMetrics`]：原子计数器
//!
//! # 线程模型
//!
//! 两条腿可以在同一线程内顺序更新（[`BilateralRunner`]），
//! 也可以用 [`LoopRunner::spawn_leg`] 各占一个线程，共享同一个停止标志。

pub mod device;
mod error;
pub mod hooks;
pub mod metrics;
pub mod recording;
pub mod runner;
pub mod simulated;

pub use device::ExoDevice;
pub use error::{DeviceError, RunnerError};
pub use hooks::{HookManager, SnapshotCallback};
pub use metrics::{RunnerMetrics, RunnerMetricsSnapshot};
pub use recording::{DEFAULT_RECORDING_CAPACITY, SnapshotRecorder};
pub use runner::{BilateralRunner, LoopConfig, LoopRunner, RunSummary, StopReason};
pub use simulated::{CommandLog, GaitWaveform, SimulatedExo};
