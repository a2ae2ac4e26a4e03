//! 传感器帧定义与原始读数解码
//!
//! 设备每个采样周期上报一帧原始整数读数（[`RawSensorFrame`]），
//! 经 [`RawSensorFrame::decode`] 转换为 SI 单位的 [`SensorFrame`] 后交给控制核心。
//!
//! # 换算系数
//!
//! | 字段 | 原始单位 | 换算 |
//! |------|----------|------|
//! | 陀螺仪 | LSB | `raw / 32.8` deg/s → rad/s |
//! | 加速度计 | LSB | `raw / 8192 × 9.81` m/s² |
//! | 电机角度 | tick | `raw × 0.02197` deg → rad |
//! | 电机速度 | deg/s | → rad/s |
//! | 电机电流 | mA | → A |
//! | 踝关节角度 | 0.01 deg | `raw / 100` deg → rad |
//! | 踝关节速度 | 0.1 deg/s | `raw / 10` deg/s → rad/s |
//! | 电池电压 | mV | → V |
//!
//! 电机与踝关节相关量乘以腿侧方向符号，使左右两侧在控制核心中具有相同的正方向。

use crate::ProtocolError;
use crate::side::LegSide;
use crate::units::{Amp, Deg, Rad, RadPerSec};
use std::str::FromStr;

/// 陀螺仪灵敏度（LSB per deg/s）
pub const GYRO_LSB_PER_DEG_S: f64 = 32.8;
/// 加速度计灵敏度（LSB per g）
pub const ACCEL_LSB_PER_G: f64 = 8192.0;
/// 重力加速度（m/s²）
pub const GRAVITY: f64 = 9.81;
/// 电机编码器分辨率（deg per tick）
pub const MOTOR_DEG_PER_TICK: f64 = 0.02197;
/// 踝关节角度分辨率（deg per LSB）
pub const ANKLE_DEG_PER_LSB: f64 = 0.01;
/// 踝关节速度分辨率（deg/s per LSB）
pub const ANKLE_VEL_DEG_S_PER_LSB: f64 = 0.1;

/// 陀螺仪轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GyroAxis {
    X,
    Y,
    /// 矢状面轴，步态检测默认使用
    #[default]
    Z,
}

impl GyroAxis {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            GyroAxis::X => 0,
            GyroAxis::Y => 1,
            GyroAxis::Z => 2,
        }
    }
}

impl FromStr for GyroAxis {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(GyroAxis::X),
            "y" => Ok(GyroAxis::Y),
            "z" => Ok(GyroAxis::Z),
            other => Err(ProtocolError::InvalidAxis(other.to_string())),
        }
    }
}

/// 设备原始读数（整数计数值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSensorFrame {
    /// 设备时间戳（毫秒）
    pub timestamp_ms: u64,
    pub gyro: [i32; 3],
    pub accel: [i32; 3],
    /// 电机编码器 tick
    pub motor_angle: i32,
    /// 电机速度（deg/s）
    pub motor_velocity: i32,
    /// 电机电流（mA）
    pub motor_current: i32,
    /// 踝关节角度（0.01 deg）
    pub ankle_angle: i32,
    /// 踝关节速度（0.1 deg/s）
    pub ankle_velocity: i32,
    /// 电池电压（mV）
    pub battery_voltage: i32,
}

/// SI 单位的传感器帧
///
/// 控制核心每个周期消费一帧。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorFrame {
    /// 设备时间戳（毫秒）
    pub timestamp_ms: u64,
    pub gyro: [RadPerSec; 3],
    /// 加速度（m/s²）
    pub accel: [f64; 3],
    pub joint_angle: Rad,
    pub joint_velocity: RadPerSec,
    pub motor_angle: Rad,
    pub motor_velocity: RadPerSec,
    pub motor_current: Amp,
    /// 电池电压（V）
    pub battery_voltage: f64,
}

impl SensorFrame {
    /// 只包含时间戳、单轴角速度和关节角度的帧（仿真与测试使用）
    pub fn new(timestamp_ms: u64, axis: GyroAxis, rate: RadPerSec, joint_angle: Rad) -> Self {
        let mut gyro = [RadPerSec::ZERO; 3];
        gyro[axis.index()] = rate;
        Self {
            timestamp_ms,
            gyro,
            joint_angle,
            ..Self::default()
        }
    }

    /// 读取指定轴的角速度
    #[inline]
    pub fn gyro_axis(&self, axis: GyroAxis) -> RadPerSec {
        self.gyro[axis.index()]
    }
}

impl RawSensorFrame {
    /// 解码为 SI 单位帧
    ///
    /// # 参数
    ///
    /// - `side`: 执行器所在腿侧，决定电机和踝关节量的方向符号
    pub fn decode(&self, side: LegSide) -> SensorFrame {
        let dir = side.direction();
        let gyro = self.gyro.map(|raw| {
            RadPerSec(Deg(f64::from(raw) / GYRO_LSB_PER_DEG_S).to_rad().0)
        });
        let accel = self
            .accel
            .map(|raw| f64::from(raw) / ACCEL_LSB_PER_G * GRAVITY);

        SensorFrame {
            timestamp_ms: self.timestamp_ms,
            gyro,
            accel,
            joint_angle: Deg(f64::from(self.ankle_angle) * ANKLE_DEG_PER_LSB).to_rad() * dir,
            joint_velocity: RadPerSec(
                (f64::from(self.ankle_velocity) * ANKLE_VEL_DEG_S_PER_LSB).to_radians() * dir,
            ),
            motor_angle: Deg(f64::from(self.motor_angle) * MOTOR_DEG_PER_TICK).to_rad() * dir,
            motor_velocity: RadPerSec(f64::from(self.motor_velocity).to_radians() * dir),
            motor_current: Amp::from_milliamps(self.motor_current) * dir,
            battery_voltage: f64::from(self.battery_voltage) / 1000.0,
        }
    }
}
