//! 线性弹簧曲线
//!
//! 以关节角为自变量：
//!
//! ```text
//! θ ≤ 0        → θ0·ks（饱和）
//! θ ≥ θ0       → 0
//! 0 < θ < θ0   → (θ0 − θ)·ks
//! ```

use super::{ProfileInput, TorqueProfile};
use crate::error::ProfileError;
use exo_protocol::{NewtonMeter, Rad};
use tracing::warn;

/// 弹簧参数
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpringParams {
    /// 中性角 θ0
    pub neutral_angle: Option<Rad>,
    /// 刚度 ks（N·m/rad）
    pub stiffness: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpringCoefficients {
    neutral_angle: f64,
    stiffness: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpringProfile {
    coeffs: Option<SpringCoefficients>,
}

impl SpringProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: &SpringParams) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        profile.set_parameters(params)?;
        Ok(profile)
    }

    fn resolve(params: &SpringParams) -> Result<SpringCoefficients, ProfileError> {
        let neutral_angle = params
            .neutral_angle
            .ok_or(ProfileError::MissingParameter("neutral_angle_rad"))?
            .0;
        let stiffness = params
            .stiffness
            .ok_or(ProfileError::MissingParameter("stiffness_nm_per_rad"))?;

        if !(neutral_angle.is_finite() && neutral_angle > 0.0) {
            return Err(ProfileError::InvalidParameter {
                name: "neutral_angle_rad",
                reason: format!("{neutral_angle} must be finite and > 0"),
            });
        }
        if !(stiffness.is_finite() && stiffness >= 0.0) {
            return Err(ProfileError::InvalidParameter {
                name: "stiffness_nm_per_rad",
                reason: format!("{stiffness} must be finite and >= 0"),
            });
        }
        Ok(SpringCoefficients {
            neutral_angle,
            stiffness,
        })
    }
}

impl TorqueProfile for SpringProfile {
    type Params = SpringParams;

    fn name(&self) -> &'static str {
        "spring"
    }

    fn set_parameters(&mut self, params: &SpringParams) -> Result<(), ProfileError> {
        match Self::resolve(params) {
            Ok(coeffs) => {
                self.coeffs = Some(coeffs);
                Ok(())
            },
            Err(e) => {
                warn!("Spring profile keeps previous parameters: {}", e);
                Err(e)
            },
        }
    }

    fn evaluate(&self, input: &ProfileInput) -> Result<NewtonMeter, ProfileError> {
        let c = self.coeffs.ok_or(ProfileError::NotConfigured("spring"))?;
        let theta = input.joint_angle.0;
        if !theta.is_finite() {
            return Ok(NewtonMeter::ZERO);
        }

        let torque = if theta <= 0.0 {
            c.neutral_angle * c.stiffness
        } else if theta >= c.neutral_angle {
            0.0
        } else {
            (c.neutral_angle - theta) * c.stiffness
        };
        Ok(NewtonMeter(torque))
    }

    fn is_configured(&self) -> bool {
        self.coeffs.is_some()
    }
}
