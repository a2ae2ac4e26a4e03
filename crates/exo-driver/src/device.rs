//! 设备边界
//!
//! 每个周期读取一帧传感器数据、下发一条电流指令。
//! 具体的串口/总线实现不在本 crate 内，只需实现 [`ExoDevice`]。

use crate::error::DeviceError;
use exo_protocol::{CurrentCommand, LegSide, SensorFrame};

/// 单腿外骨骼设备
pub trait ExoDevice: Send {
    /// 设备安装的腿侧
    fn side(&self) -> LegSide;

    /// 读取一帧（阻塞至多一个周期）
    fn read_frame(&mut self) -> Result<SensorFrame, DeviceError>;

    /// 下发电流指令（已饱和、已带方向符号）
    fn command_current(&mut self, command: CurrentCommand) -> Result<(), DeviceError>;

    /// 停止助力
    ///
    /// 默认实现下发零电流。
    fn stop(&mut self) -> Result<(), DeviceError> {
        self.command_current(CurrentCommand::ZERO)
    }
}
