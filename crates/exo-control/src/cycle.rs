//! 控制周期
//!
//! 每条腿每个采样周期：
//!
//! ```text
//! SensorFrame ─> PhaseEstimator.update ─> TorqueProfile.evaluate ─> 安全钳位
//!             ─> ActuatorMapper.command ─> CurrentCommand + CycleSnapshot
//! ```
//!
//! 两条腿是两个独立的 [`LegController`] 实例，没有共享的可变状态；
//! 力矩曲线通过 [`SharedProfile`] 只读共享。
//!
//! # 示例
//!
//! ```rust
//! use exo_control::{ControlCycle, LegController, SharedProfile};
//! use exo_protocol::{GyroAxis, LegSide, Rad, RadPerSec, SensorFrame};
//! use exo_tools::ExoConfig;
//!
//! let config = ExoConfig::default();
//! let profile = SharedProfile::from_settings(&config.profile).unwrap();
//! let mut leg = LegController::from_config(&config, "left", profile).unwrap();
//!
//! let frame = SensorFrame::new(0, GyroAxis::Z, RadPerSec(10.0), Rad(0.1));
//! let snapshot = leg.step(&frame);
//! // 尚未建立时间基准，不输出力矩
//! assert_eq!(snapshot.percent_gait, None);
//! assert!(snapshot.command.is_zero());
//! ```

use crate::actuator::{ActuatorMapper, TransmissionModel};
use crate::error::ControlError;
use crate::gait::{EstimatorCounters, PhaseEstimator, StancePhase};
use crate::profile::{ProfileInput, SharedProfile};
use exo_protocol::{Amp, CurrentCommand, GyroAxis, LegSide, NewtonMeter, SensorFrame};
use exo_tools::{EstimatorSettings, ExoConfig, SafetyLimits};
use tracing::{debug, info};

/// 单个周期的只读快照（供日志/录制使用）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleSnapshot {
    pub timestamp_ms: u64,
    pub side: Option<LegSide>,
    pub percent_gait: Option<f64>,
    pub percent_stance: StancePhase,
    pub heelstrike: bool,
    pub toeoff: bool,
    /// 目标关节力矩（安全钳位后）
    pub torque_cmd: NewtonMeter,
    pub transmission_ratio: f64,
    /// 饱和前的电机电流
    pub current_cmd: Amp,
    /// 实际下发的设备指令
    pub command: CurrentCommand,
    pub saturated: bool,
}

/// 控制周期接口
///
/// 运行器按固定频率对每帧调用 `step`，并把返回的指令下发给设备。
pub trait ControlCycle: Send {
    fn side(&self) -> LegSide;

    /// 处理一帧并生成指令
    fn step(&mut self, frame: &SensorFrame) -> CycleSnapshot;

    /// 重置步态状态（试次之间）
    fn reset(&mut self);
}

/// 单腿控制器
#[derive(Debug, Clone)]
pub struct LegController {
    side: LegSide,
    gyro_axis: GyroAxis,
    estimator: PhaseEstimator,
    profile: SharedProfile,
    mapper: ActuatorMapper,
    safety: SafetyLimits,
}

impl LegController {
    pub fn new(
        estimator_settings: &EstimatorSettings,
        transmission: TransmissionModel,
        profile: SharedProfile,
        safety: SafetyLimits,
    ) -> Result<Self, ControlError> {
        let estimator = PhaseEstimator::new(estimator_settings)?;
        Ok(Self {
            side: transmission.side(),
            gyro_axis: estimator_settings.gyro_axis,
            estimator,
            profile,
            mapper: ActuatorMapper::new(transmission),
            safety,
        })
    }

    /// 按配置文件中的设备 ID 构建
    pub fn from_config(
        config: &ExoConfig,
        device_id: &str,
        profile: SharedProfile,
    ) -> Result<Self, ControlError> {
        let device = config.device(device_id)?;
        let transmission = TransmissionModel::from_settings(
            &device.transmission,
            device.side,
            Amp(config.effective_current_limit(device)),
        )?;
        info!(
            "Leg controller for device {} ({}) using {} profile",
            device_id,
            device.side,
            profile.load().name()
        );
        Self::new(&config.estimator, transmission, profile, config.safety.clone())
    }

    pub fn estimator(&self) -> &PhaseEstimator {
        &self.estimator
    }

    pub fn counters(&self) -> EstimatorCounters {
        self.estimator.counters()
    }

    pub fn mapper(&self) -> &ActuatorMapper {
        &self.mapper
    }

    pub fn profile(&self) -> &SharedProfile {
        &self.profile
    }
}

impl ControlCycle for LegController {
    fn side(&self) -> LegSide {
        self.side
    }

    fn step(&mut self, frame: &SensorFrame) -> CycleSnapshot {
        let events = self
            .estimator
            .update(frame.timestamp_ms, frame.gyro_axis(self.gyro_axis));

        if events.heelstrike {
            debug!(
                "{} heelstrike at {} ms, expected stride {:?} ms",
                self.side,
                frame.timestamp_ms,
                self.estimator.expected_stride_ms()
            );
        }

        let input = ProfileInput {
            percent_gait: self.estimator.percent_gait(),
            percent_stance: self.estimator.percent_stance(),
            joint_angle: frame.joint_angle,
        };
        let torque = NewtonMeter(self.safety.clamp_torque(self.profile.torque(&input).0));
        // 时间基准建立后才施加预紧电流
        let actuator = if input.percent_gait.is_some() {
            self.mapper.command_tensioned(torque, frame.joint_angle)
        } else {
            self.mapper.command(torque, frame.joint_angle)
        };

        CycleSnapshot {
            timestamp_ms: frame.timestamp_ms,
            side: Some(self.side),
            percent_gait: input.percent_gait,
            percent_stance: input.percent_stance,
            heelstrike: events.heelstrike,
            toeoff: events.toeoff,
            torque_cmd: torque,
            transmission_ratio: actuator.ratio,
            current_cmd: actuator.current,
            command: actuator.command,
            saturated: actuator.saturated,
        }
    }

    fn reset(&mut self) {
        info!("{} leg gait state cleared", self.side);
        self.estimator.clear();
    }
}

/// 双腿控制器（同一线程内顺序更新两条腿）
#[derive(Debug, Clone)]
pub struct BilateralController {
    pub left: LegController,
    pub right: LegController,
}

impl BilateralController {
    /// 用配置中左右两侧的第一台设备构建，两条腿共享同一条曲线
    pub fn from_config(config: &ExoConfig, profile: SharedProfile) -> Result<Self, ControlError> {
        let id_for = |side: LegSide| -> Result<String, ControlError> {
            config
                .device_for_side(side)
                .map(|(id, _)| id.to_string())
                .ok_or_else(|| {
                    ControlError::Config(exo_tools::ConfigError::UnknownDevice(format!(
                        "<{side}>"
                    )))
                })
        };
        let left = LegController::from_config(config, &id_for(LegSide::Left)?, profile.clone())?;
        let right = LegController::from_config(config, &id_for(LegSide::Right)?, profile)?;
        Ok(Self { left, right })
    }

    pub fn step(
        &mut self,
        left: &SensorFrame,
        right: &SensorFrame,
    ) -> (CycleSnapshot, CycleSnapshot) {
        (self.left.step(left), self.right.step(right))
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
