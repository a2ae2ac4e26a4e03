//! Exo SDK - 踝关节外骨骼步态相位力矩控制
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 单位类型、传感器帧解码、电流指令
//! - **工具层** (`tools`): TOML 配置、安全限制、统计
//! - **控制层** (`control`): 相位估计 → 力矩曲线 → 执行器映射
//! - **驱动层** (`driver`): 设备接口、固定频率控制循环、快照录制
//!
//! # 快速开始
//!
//! ```rust
//! use exo_sdk::prelude::*;
//!
//! let config = ExoConfig::default();
//! let profile = SharedProfile::from_settings(&config.profile).unwrap();
//! let mut legs = BilateralController::from_config(&config, profile).unwrap();
//!
//! let mut left = SimulatedExo::new(LegSide::Left);
//! let mut right = SimulatedExo::new(LegSide::Right);
//! let runner = BilateralRunner::new(
//!     LoopRunner::new(LoopConfig {
//!         frequency_hz: 5000.0,
//!         max_cycles: Some(10),
//!         ..LoopConfig::default()
//!     })
//!     .unwrap(),
//! );
//! let summary = runner.run(&mut legs, &mut left, &mut right).unwrap();
//! assert_eq!(summary.cycles, 10);
//! ```

pub use exo_control as control;
pub use exo_driver as driver;
pub use exo_protocol as protocol;
pub use exo_tools as tools;

mod logging;
pub mod prelude;

pub use logging::{LoggerError, init_logger, try_init_logger};

// --- 常用类型 ---

pub use exo_control::{
    BilateralController, ControlCycle, ControlError, CycleSnapshot, LegController,
    PhaseEstimator, Profile, ProfileError, SharedProfile, StancePhase,
};
pub use exo_driver::{
    BilateralRunner, DeviceError, ExoDevice, LoopConfig, LoopRunner, RunnerError,
    SimulatedExo, SnapshotRecorder,
};
pub use exo_protocol::{CurrentCommand, LegSide, SensorFrame};
pub use exo_tools::{ConfigError, ExoConfig};
