//! 样条助力曲线
//!
//! 自变量为相位百分比（步态或支撑相），分四段：
//!
//! ```text
//! phase < t0 或 phase > t3  → 0
//! t0 ≤ phase ≤ t1           → 0 到 ts 的线性斜坡
//! t1 < phase ≤ t2           → 上升段 Hermite 三次（ts → tp）
//! t2 < phase ≤ t3           → 下降段 Hermite 三次（tp → ts）
//! ```
//!
//! 其中 `tp = user_mass × peak_torque_normalized`。两段三次都在端点处斜率为 0。
//!
//! # 变体
//!
//! - [`SplineProfile::percent_gait`]：步态百分比曲线（Zhang et al. 2017）
//! - [`SplineProfile::percent_stance`]：支撑相百分比曲线，断点间距至少 20 个百分点
//!   （Witte et al. 2020），间距不足时从 t3 向前钳位

use super::hermite::CubicSegment;
use super::{ProfileInput, TorqueProfile};
use crate::error::ProfileError;
use crate::gait::StancePhase;
use exo_protocol::NewtonMeter;
use exo_tools::SplineSettings;
use tracing::{info, warn};

/// 支撑相曲线的最小断点间距（百分点）
pub const PERCENT_STANCE_MIN_SPACING: f64 = 20.0;

/// 曲线自变量来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSource {
    PercentGait,
    PercentStance,
}

/// 由参数解出的断点与系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineCoefficients {
    pub t0: f64,
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
    /// 起始力矩
    pub ts: f64,
    /// 峰值力矩
    pub tp: f64,
    pub rising: CubicSegment,
    pub falling: CubicSegment,
}

impl SplineCoefficients {
    /// 在给定相位求值
    pub fn torque_at(&self, phase: f64) -> f64 {
        if !phase.is_finite() || phase < self.t0 || phase > self.t3 {
            0.0
        } else if phase <= self.t1 {
            if self.t1 > self.t0 {
                self.ts * (phase - self.t0) / (self.t1 - self.t0)
            } else {
                self.ts
            }
        } else if phase <= self.t2 {
            self.rising.value(phase)
        } else {
            self.falling.value(phase)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplineProfile {
    source: PhaseSource,
    min_spacing: Option<f64>,
    coeffs: Option<SplineCoefficients>,
}

impl SplineProfile {
    /// 步态百分比曲线（未配置）
    pub fn percent_gait() -> Self {
        Self {
            source: PhaseSource::PercentGait,
            min_spacing: None,
            coeffs: None,
        }
    }

    /// 支撑相百分比曲线（未配置）
    pub fn percent_stance() -> Self {
        Self {
            source: PhaseSource::PercentStance,
            min_spacing: Some(PERCENT_STANCE_MIN_SPACING),
            coeffs: None,
        }
    }

    pub fn source(&self) -> PhaseSource {
        self.source
    }

    pub fn coefficients(&self) -> Option<&SplineCoefficients> {
        self.coeffs.as_ref()
    }

    /// 从输入中取出本曲线的自变量，相位未定义或处于摆动相时为 `None`
    fn phase(&self, input: &ProfileInput) -> Option<f64> {
        match self.source {
            PhaseSource::PercentGait => input.percent_gait,
            PhaseSource::PercentStance => match input.percent_stance {
                StancePhase::Stance(p) => Some(p),
                StancePhase::Undefined | StancePhase::Swing => None,
            },
        }
    }

    fn resolve(&self, params: &SplineSettings) -> Result<SplineCoefficients, ProfileError> {
        let get = |value: Option<f64>, name: &'static str| -> Result<f64, ProfileError> {
            let v = value.ok_or(ProfileError::MissingParameter(name))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(ProfileError::InvalidParameter {
                    name,
                    reason: format!("{v} is not finite"),
                })
            }
        };

        let mut t0 = get(params.t0, "t0")?;
        let mut t1 = get(params.t1, "t1")?;
        let mut t2 = get(params.t2, "t2")?;
        let t3 = get(params.t3, "t3")?;
        let ts = get(params.onset_torque_nm, "onset_torque_nm")?;
        let peak_normalized = get(params.peak_torque_normalized, "peak_torque_normalized")?;
        let mass = get(params.user_mass_kg, "user_mass_kg")?;

        if mass <= 0.0 {
            return Err(ProfileError::InvalidParameter {
                name: "user_mass_kg",
                reason: format!("{mass} must be > 0"),
            });
        }

        if let Some(spacing) = self.min_spacing {
            if t3 - t2 < spacing {
                t2 = t3 - spacing;
            }
            if t2 - t1 < spacing {
                t1 = t2 - spacing;
            }
            t0 = t0.min(t1);
        }

        if !(t0 <= t1 && t1 < t2 && t2 < t3) {
            return Err(ProfileError::InvalidParameter {
                name: "t0..t3",
                reason: format!("breakpoints must satisfy t0 <= t1 < t2 < t3, got {t0}, {t1}, {t2}, {t3}"),
            });
        }

        let tp = mass * peak_normalized;
        let invalid_segment = || ProfileError::InvalidParameter {
            name: "t0..t3",
            reason: "spline segment is degenerate".to_string(),
        };
        let rising = CubicSegment::hermite(t1, ts, t2, tp).ok_or_else(invalid_segment)?;
        let falling = CubicSegment::hermite(t2, tp, t3, ts).ok_or_else(invalid_segment)?;

        Ok(SplineCoefficients {
            t0,
            t1,
            t2,
            t3,
            ts,
            tp,
            rising,
            falling,
        })
    }
}

impl TorqueProfile for SplineProfile {
    type Params = SplineSettings;

    fn name(&self) -> &'static str {
        match self.source {
            PhaseSource::PercentGait => "percent_gait",
            PhaseSource::PercentStance => "percent_stance",
        }
    }

    fn set_parameters(&mut self, params: &SplineSettings) -> Result<(), ProfileError> {
        match self.resolve(params) {
            Ok(coeffs) => {
                info!(
                    "{} profile configured: t = [{:.2}, {:.2}, {:.2}, {:.2}], ts = {:.2} Nm, tp = {:.2} Nm",
                    self.name(),
                    coeffs.t0,
                    coeffs.t1,
                    coeffs.t2,
                    coeffs.t3,
                    coeffs.ts,
                    coeffs.tp
                );
                self.coeffs = Some(coeffs);
                Ok(())
            },
            Err(e) => {
                warn!(
                    "{} profile keeps previous coefficients: {}",
                    self.name(),
                    e
                );
                Err(e)
            },
        }
    }

    fn evaluate(&self, input: &ProfileInput) -> Result<NewtonMeter, ProfileError> {
        let coeffs = self
            .coeffs
            .as_ref()
            .ok_or(ProfileError::NotConfigured(self.name()))?;
        let torque = self.phase(input).map_or(0.0, |p| coeffs.torque_at(p));
        Ok(NewtonMeter(torque))
    }

    fn is_configured(&self) -> bool {
        self.coeffs.is_some()
    }
}
