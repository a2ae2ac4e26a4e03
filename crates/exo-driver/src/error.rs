//! 驱动层错误类型定义

use exo_control::ControlError;
use thiserror::Error;

/// 设备边界错误
///
/// 读写均为同步调用，失败时由运行器计数并决定是否停止。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// 本周期内没有收到传感器帧
    #[error("Sensor read timeout")]
    Timeout,

    /// 设备断开
    #[error("Device disconnected")]
    Disconnected,

    /// 传感器帧无法解析
    #[error("Invalid sensor frame: {0}")]
    InvalidFrame(String),

    /// 电流指令下发失败
    #[error("Command write failed: {0}")]
    Write(String),
}

/// 控制循环错误
#[derive(Error, Debug)]
pub enum RunnerError {
    /// 循环配置不合法
    #[error("Invalid loop configuration: {0}")]
    Config(String),

    /// 控制器构建失败
    #[error("Control setup error: {0}")]
    Control(#[from] ControlError),

    /// 设备错误
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// 连续设备错误超过上限
    #[error("Stopped after {count} consecutive device errors (last: {last})")]
    TooManyErrors { count: u32, last: DeviceError },

    /// 控制线程创建失败
    #[error("Failed to spawn control thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 控制线程 panic
    #[error("Control thread panicked")]
    ThreadPanicked,
}
