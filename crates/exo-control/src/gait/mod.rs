//! 步态相位估计
//!
//! - `trigger` - 迟滞触发器（脚跟着地 / 脚尖离地）
//! - `duration_filter` - 自适应步幅/支撑相时长滤波
//! - `estimator` - `PhaseEstimator`，组合以上两者输出相位

pub mod duration_filter;
pub mod estimator;
pub mod trigger;

pub use duration_filter::{DurationFilter, FilterOutcome};
pub use estimator::{EstimatorCounters, GaitEvents, GaitState, PhaseEstimator, StancePhase};
pub use trigger::{HysteresisTrigger, TriggerFire, TriggerKind};
