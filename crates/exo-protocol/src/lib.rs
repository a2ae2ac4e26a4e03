//! # Exo Protocol
//!
//! 踝关节外骨骼设备数据定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `units`: 强类型单位（`Rad`、`RadPerSec`、`NewtonMeter`、`Amp`）
//! - `side`: 腿侧与方向符号
//! - `frame`: 传感器帧与原始读数解码
//! - `command`: 电流指令
//!
//! ## 层次
//!
//! ```text
//! exo-protocol (此 crate，纯数据)
//!     ↓
//! exo-control (相位估计 / 力矩曲线 / 执行器映射)
//!     ↓
//! exo-driver (设备边界与控制循环)
//! ```

pub mod command;
pub mod frame;
pub mod side;
pub mod units;

pub use command::CurrentCommand;
pub use frame::{GyroAxis, RawSensorFrame, SensorFrame};
pub use side::LegSide;
pub use units::{Amp, Deg, NewtonMeter, Rad, RadPerSec};

use thiserror::Error;

/// 协议层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 无法识别的腿侧名称
    #[error("Invalid leg side: {0:?} (expected \"left\" or \"right\")")]
    InvalidSide(String),

    /// 无法识别的陀螺仪轴
    #[error("Invalid gyro axis: {0:?} (expected x, y or z)")]
    InvalidAxis(String),
}
