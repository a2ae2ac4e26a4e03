//! # Exo Control
//!
//! 踝关节外骨骼控制核心：相位估计 → 力矩曲线 → 执行器映射。
//!
//! ## 模块
//!
//! - `gait`: 步态事件检测与自适应时间基准（`PhaseEstimator`）
//! - `profile`: 力矩曲线族（零力矩、线性弹簧、样条助力）与原子替换句柄
//! - `actuator`: 传动比模型与力矩 → 电流换算
//! - `cycle`: 单腿/双腿控制周期
//!
//! ## 实时约束
//!
//! 核心内所有操作都不阻塞、不等待 I/O、不做无界分配。
//! 数值异常（未定义相位、NaN、传动比奇点）一律降级为 0 输出，不向上传播。

pub mod actuator;
pub mod cycle;
pub mod error;
pub mod gait;
pub mod profile;

pub use actuator::{ActuatorCommand, ActuatorMapper, TransmissionModel};
pub use cycle::{BilateralController, ControlCycle, CycleSnapshot, LegController};
pub use error::{ControlError, ProfileError, TransmissionError};
pub use gait::{GaitEvents, GaitState, PhaseEstimator, StancePhase};
pub use profile::{Profile, ProfileInput, SharedProfile, TorqueProfile};
