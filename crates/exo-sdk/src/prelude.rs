//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use exo_sdk::prelude::*;
//! ```

// 控制层
pub use exo_control::{
    BilateralController, ControlCycle, CycleSnapshot, LegController, ProfileInput,
    SharedProfile, StancePhase, TorqueProfile,
};

// 驱动层
pub use exo_driver::{
    BilateralRunner, ExoDevice, LoopConfig, LoopRunner, SimulatedExo, SnapshotCallback,
    SnapshotRecorder,
};

// 单位与帧
pub use exo_protocol::{
    Amp, CurrentCommand, GyroAxis, LegSide, NewtonMeter, Rad, RadPerSec, SensorFrame,
};

// 配置
pub use exo_tools::{ExoConfig, ProfileSettings, SafetyLimits};

// 错误类型
pub use exo_control::{ControlError, ProfileError};
pub use exo_driver::{DeviceError, RunnerError};
pub use exo_tools::ConfigError;
