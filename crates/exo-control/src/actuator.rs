//! 执行器映射
//!
//! 把目标关节力矩换算为电机电流指令。
//!
//! # 算法
//!
//! ```text
//! ratio   = 5·p4·θ⁴ + 4·p3·θ³ + 3·p2·θ² + 2·p1·θ + p0     （下限 1.0）
//! current = (τ / ratio) / kt
//! command = clamp(current, ±limit) × direction → mA
//! ```
//!
//! `ratio` 是电机角对关节角的导数（离线拟合的五次多项式求导）。
//! 非有限的传动比按 1.0 处理，非有限的力矩或角度输出 0 电流。
//!
//! 设置了预紧电流时，[`ActuatorMapper::command_tensioned`] 在饱和前把电流抬到不低于预紧值，
//! 控制周期在时间基准建立后使用它，使绑带在零力矩区间保持张紧。

use crate::error::TransmissionError;
use exo_protocol::{Amp, CurrentCommand, LegSide, NewtonMeter, Rad};
use exo_tools::TransmissionSettings;
use tracing::{info, warn};

/// 传动比下限
pub const MIN_TRANSMISSION_RATIO: f64 = 1.0;

/// 传动模型（设备初始化后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionModel {
    /// `[p4, p3, p2, p1, p0]`
    coeffs: [f64; 5],
    kt: f64,
    current_limit: Amp,
    pretension: Amp,
    side: LegSide,
}

impl TransmissionModel {
    /// 创建传动模型
    ///
    /// # 参数
    ///
    /// - `coeffs`: `[p4, p3, p2, p1, p0]`
    /// - `kt`: 电机力矩常数（N·m/A），必须 > 0
    /// - `current_limit`: 电流饱和限制，必须 > 0
    /// - `side`: 安装腿侧，决定指令方向符号
    pub fn new(
        coeffs: [f64; 5],
        kt: f64,
        current_limit: Amp,
        side: LegSide,
    ) -> Result<Self, TransmissionError> {
        const NAMES: [&str; 5] = ["poly4", "poly3", "poly2", "poly1", "poly0"];
        for (name, value) in NAMES.into_iter().zip(coeffs) {
            if !value.is_finite() {
                return Err(TransmissionError::InvalidParameter { name, value });
            }
        }
        if !(kt.is_finite() && kt > 0.0) {
            return Err(TransmissionError::InvalidParameter {
                name: "kt_nm_per_a",
                value: kt,
            });
        }
        if !(current_limit.is_finite() && current_limit.0 > 0.0) {
            return Err(TransmissionError::InvalidParameter {
                name: "current_limit_a",
                value: current_limit.0,
            });
        }
        Ok(Self {
            coeffs,
            kt,
            current_limit,
            pretension: Amp::ZERO,
            side,
        })
    }

    /// 设置预紧电流，必须在 `[0, current_limit]` 内
    pub fn with_pretension(mut self, pretension: Amp) -> Result<Self, TransmissionError> {
        if !(pretension.0 >= 0.0 && pretension <= self.current_limit) {
            return Err(TransmissionError::InvalidParameter {
                name: "pretension_current_a",
                value: pretension.0,
            });
        }
        self.pretension = pretension;
        Ok(self)
    }

    /// 由配置创建
    ///
    /// `current_limit` 为已与全局安全限制合并后的值。
    pub fn from_settings(
        settings: &TransmissionSettings,
        side: LegSide,
        current_limit: Amp,
    ) -> Result<Self, TransmissionError> {
        let coeff = |v: Option<f64>, name| v.ok_or(TransmissionError::MissingCoefficient(name));
        let coeffs = [
            coeff(settings.poly4, "poly4")?,
            coeff(settings.poly3, "poly3")?,
            coeff(settings.poly2, "poly2")?,
            coeff(settings.poly1, "poly1")?,
            coeff(settings.poly0, "poly0")?,
        ];
        Self::new(coeffs, settings.kt_nm_per_a, current_limit, side)?
            .with_pretension(Amp(settings.pretension_current_a))
    }

    /// 给定关节角处的传动比，不小于 [`MIN_TRANSMISSION_RATIO`]
    pub fn ratio_at(&self, angle: Rad) -> f64 {
        let [p4, p3, p2, p1, p0] = self.coeffs;
        let x = angle.0;
        let ratio = (((5.0 * p4 * x + 4.0 * p3) * x + 3.0 * p2) * x + 2.0 * p1) * x + p0;
        // NaN 不满足比较，同样落到下限
        if ratio >= MIN_TRANSMISSION_RATIO {
            ratio
        } else {
            MIN_TRANSMISSION_RATIO
        }
    }

    pub fn kt(&self) -> f64 {
        self.kt
    }

    pub fn current_limit(&self) -> Amp {
        self.current_limit
    }

    pub fn pretension(&self) -> Amp {
        self.pretension
    }

    pub fn side(&self) -> LegSide {
        self.side
    }
}

/// 单个周期的执行器输出
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorCommand {
    /// 本周期使用的传动比
    pub ratio: f64,
    /// 饱和前的电机电流（关节坐标系）
    pub current: Amp,
    /// 饱和、加方向后的设备指令
    pub command: CurrentCommand,
    /// 是否触发饱和
    pub saturated: bool,
}

/// 力矩到电流的映射器
#[derive(Debug, Clone)]
pub struct ActuatorMapper {
    model: TransmissionModel,
    last_ratio: Option<f64>,
    saturating: bool,
}

impl ActuatorMapper {
    pub fn new(model: TransmissionModel) -> Self {
        info!(
            "Actuator mapper ({}) kt = {} Nm/A, limit = {}",
            model.side, model.kt, model.current_limit
        );
        Self {
            model,
            last_ratio: None,
            saturating: false,
        }
    }

    /// 力矩 → 电机电流（未饱和、未加方向）
    pub fn to_current(&mut self, torque: NewtonMeter, angle: Rad) -> Amp {
        let ratio = self.model.ratio_at(angle);
        self.last_ratio = Some(ratio);
        if !(torque.is_finite() && angle.is_finite()) {
            return Amp::ZERO;
        }
        Amp(torque.0 / ratio / self.model.kt)
    }

    /// 完整的指令生成：换算、饱和、方向、毫安
    pub fn command(&mut self, torque: NewtonMeter, angle: Rad) -> ActuatorCommand {
        let current = self.to_current(torque, angle);
        self.finish(current)
    }

    /// 同 [`command`](Self::command)，但电流不低于预紧电流
    pub fn command_tensioned(&mut self, torque: NewtonMeter, angle: Rad) -> ActuatorCommand {
        let current = self.to_current(torque, angle);
        let pretension = self.model.pretension;
        self.finish(if current < pretension { pretension } else { current })
    }

    fn finish(&mut self, current: Amp) -> ActuatorCommand {
        let limit = self.model.current_limit;
        let saturated = current.abs() > limit;
        let clamped = current.clamp(-limit, limit);

        if saturated && !self.saturating {
            warn!(
                "{} actuator current saturated: {} requested, limit {}",
                self.model.side, current, limit
            );
        }
        self.saturating = saturated;

        ActuatorCommand {
            ratio: self.last_ratio.unwrap_or(MIN_TRANSMISSION_RATIO),
            current,
            command: CurrentCommand::from_amps(clamped * self.model.side.direction()),
            saturated,
        }
    }

    /// 最近一次使用的传动比（诊断用）
    pub fn last_ratio(&self) -> Option<f64> {
        self.last_ratio
    }

    pub fn model(&self) -> &TransmissionModel {
        &self.model
    }
}
