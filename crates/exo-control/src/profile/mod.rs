//! 力矩曲线
//!
//! 把相位估计（或关节角）映射为目标关节力矩。
//!
//! # 设计
//!
//! - [`TorqueProfile`] trait：`set_parameters` 只在参数变化时重新计算系数，`evaluate` 为纯函数
//! - [`Profile`] 枚举：按配置选择的具体曲线
//! - [`SharedProfile`]：`ArcSwap` 句柄，参数更新在控制线程外构建完整的新曲线后一次性发布，
//!   控制周期看到的要么是旧系数，要么是新系数
//!
//! 参数更新失败时继续使用之前的系数；从未成功配置过的曲线返回 `NotConfigured`，
//! 控制周期据此输出 0 力矩。

pub mod hermite;
pub mod spline;
pub mod spring;
pub mod zero;

pub use hermite::CubicSegment;
pub use spline::{PhaseSource, SplineCoefficients, SplineProfile};
pub use spring::{SpringParams, SpringProfile};
pub use zero::ZeroProfile;

use crate::error::ProfileError;
use crate::gait::StancePhase;
use arc_swap::ArcSwap;
use exo_protocol::{NewtonMeter, Rad};
use exo_tools::ProfileSettings;
use std::sync::Arc;
use tracing::{debug, info};

/// 曲线输入
///
/// 各曲线只读取自己的自变量：样条曲线读相位，弹簧读关节角。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileInput {
    pub percent_gait: Option<f64>,
    pub percent_stance: StancePhase,
    pub joint_angle: Rad,
}

impl ProfileInput {
    /// 相位全部未定义
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn percent_gait(percent: f64) -> Self {
        Self {
            percent_gait: Some(percent),
            ..Self::default()
        }
    }

    pub fn percent_stance(percent: f64) -> Self {
        Self {
            percent_stance: StancePhase::Stance(percent),
            ..Self::default()
        }
    }

    pub fn joint_angle(angle: Rad) -> Self {
        Self {
            joint_angle: angle,
            ..Self::default()
        }
    }
}

/// 力矩曲线通用接口
pub trait TorqueProfile {
    /// 曲线参数类型
    type Params;

    fn name(&self) -> &'static str;

    /// 设置参数并重新计算系数
    ///
    /// 失败时保持之前的系数不变。
    fn set_parameters(&mut self, params: &Self::Params) -> Result<(), ProfileError>;

    /// 求目标力矩
    ///
    /// # 返回
    ///
    /// - `Ok(torque)`: 相位未定义时为 0
    /// - `Err(NotConfigured)`: 从未成功设置过参数
    fn evaluate(&self, input: &ProfileInput) -> Result<NewtonMeter, ProfileError>;

    fn is_configured(&self) -> bool;
}

/// 按配置选择的曲线
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Zero(ZeroProfile),
    Spring(SpringProfile),
    Spline(SplineProfile),
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Zero(ZeroProfile)
    }
}

impl Profile {
    /// 由配置构建并设置参数
    pub fn from_settings(settings: &ProfileSettings) -> Result<Self, ProfileError> {
        let profile = match settings {
            ProfileSettings::Zero => Profile::Zero(ZeroProfile),
            ProfileSettings::Spring {
                neutral_angle_rad,
                stiffness_nm_per_rad,
            } => Profile::Spring(SpringProfile::with_params(&SpringParams {
                neutral_angle: neutral_angle_rad.map(Rad),
                stiffness: *stiffness_nm_per_rad,
            })?),
            ProfileSettings::PercentGait(params) => {
                let mut p = SplineProfile::percent_gait();
                p.set_parameters(params)?;
                Profile::Spline(p)
            },
            ProfileSettings::PercentStance(params) => {
                let mut p = SplineProfile::percent_stance();
                p.set_parameters(params)?;
                Profile::Spline(p)
            },
        };
        Ok(profile)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Zero(p) => p.name(),
            Profile::Spring(p) => p.name(),
            Profile::Spline(p) => p.name(),
        }
    }

    pub fn evaluate(&self, input: &ProfileInput) -> Result<NewtonMeter, ProfileError> {
        match self {
            Profile::Zero(p) => p.evaluate(input),
            Profile::Spring(p) => p.evaluate(input),
            Profile::Spline(p) => p.evaluate(input),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self {
            Profile::Zero(p) => p.is_configured(),
            Profile::Spring(p) => p.is_configured(),
            Profile::Spline(p) => p.is_configured(),
        }
    }

    /// 控制周期使用的求值：未配置或结果非有限时输出 0
    pub fn torque(&self, input: &ProfileInput) -> NewtonMeter {
        match self.evaluate(input) {
            Ok(torque) if torque.is_finite() => torque,
            Ok(torque) => {
                debug!("{} profile produced non-finite torque {}", self.name(), torque.0);
                NewtonMeter::ZERO
            },
            Err(e) => {
                debug!("{}", e);
                NewtonMeter::ZERO
            },
        }
    }

    /// 以本曲线的自变量构造输入
    ///
    /// 样条曲线为相位百分比，弹簧为关节角（rad）。
    pub fn input_for(&self, x: f64) -> ProfileInput {
        match self {
            Profile::Zero(_) => ProfileInput::percent_gait(x),
            Profile::Spring(_) => ProfileInput::joint_angle(Rad(x)),
            Profile::Spline(p) => match p.source() {
                PhaseSource::PercentGait => ProfileInput::percent_gait(x),
                PhaseSource::PercentStance => ProfileInput::percent_stance(x),
            },
        }
    }

    /// 在 `[from, to]` 上等间距采样 `steps + 1` 个点
    pub fn sample_curve(&self, from: f64, to: f64, steps: usize) -> Vec<(f64, NewtonMeter)> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let x = from + (to - from) * i as f64 / steps as f64;
                (x, self.torque(&self.input_for(x)))
            })
            .collect()
    }
}

/// 可跨线程共享、可原子替换的曲线句柄
///
/// 克隆开销为一次 `Arc` 引用计数。
#[derive(Debug, Clone)]
pub struct SharedProfile {
    inner: Arc<ArcSwap<Profile>>,
}

impl Default for SharedProfile {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

impl SharedProfile {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(profile)),
        }
    }

    pub fn from_settings(settings: &ProfileSettings) -> Result<Self, ProfileError> {
        Ok(Self::new(Profile::from_settings(settings)?))
    }

    /// 当前曲线的快照
    pub fn load(&self) -> Arc<Profile> {
        self.inner.load_full()
    }

    /// 控制周期求值（无锁）
    pub fn torque(&self, input: &ProfileInput) -> NewtonMeter {
        self.inner.load().torque(input)
    }

    /// 按新配置构建曲线并发布
    ///
    /// 构建失败时已发布的曲线保持不变。
    pub fn update(&self, settings: &ProfileSettings) -> Result<(), ProfileError> {
        let profile = Profile::from_settings(settings)?;
        info!("Publishing {} profile", profile.name());
        self.inner.store(Arc::new(profile));
        Ok(())
    }

    /// 直接替换为已构建好的曲线
    pub fn replace(&self, profile: Profile) {
        self.inner.store(Arc::new(profile));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_tools::SplineSettings;

    #[test]
    fn test_from_settings_variants() {
        let zero = Profile::from_settings(&ProfileSettings::Zero).unwrap();
        assert_eq!(zero.name(), "zero");

        let gait = Profile::from_settings(&ProfileSettings::default()).unwrap();
        assert_eq!(gait.name(), "percent_gait");
        assert!(gait.is_configured());

        let stance = Profile::from_settings(&ProfileSettings::PercentStance(
            SplineSettings::percent_stance_reference(),
        ))
        .unwrap();
        assert_eq!(stance.name(), "percent_stance");

        let spring = Profile::from_settings(&ProfileSettings::Spring {
            neutral_angle_rad: Some(0.3),
            stiffness_nm_per_rad: Some(10.0),
        })
        .unwrap();
        assert!((spring.torque(&ProfileInput::joint_angle(Rad(0.0))).0 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_settings_missing_parameter() {
        let err = Profile::from_settings(&ProfileSettings::Spring {
            neutral_angle_rad: None,
            stiffness_nm_per_rad: Some(10.0),
        })
        .unwrap_err();
        assert_eq!(err, ProfileError::MissingParameter("neutral_angle_rad"));

        let err = Profile::from_settings(&ProfileSettings::PercentGait(SplineSettings {
            t3: None,
            ..SplineSettings::percent_gait_reference()
        }))
        .unwrap_err();
        assert_eq!(err, ProfileError::MissingParameter("t3"));
    }

    #[test]
    fn test_torque_not_configured_is_zero() {
        let profile = Profile::Spline(SplineProfile::percent_gait());
        assert!(!profile.is_configured());
        assert_eq!(profile.torque(&ProfileInput::percent_gait(50.0)), NewtonMeter::ZERO);
    }

    #[test]
    fn test_sample_curve() {
        let profile = Profile::from_settings(&ProfileSettings::default()).unwrap();
        let samples = profile.sample_curve(0.0, 100.0, 100);
        assert_eq!(samples.len(), 101);
        assert_eq!(samples[0], (0.0, NewtonMeter::ZERO));
        assert_eq!(samples[80].1, NewtonMeter::ZERO);
        let peak = samples
            .iter()
            .map(|(_, t)| t.0)
            .fold(f64::MIN, f64::max);
        assert!(peak <= 20.0 + 1e-9);
        assert!(peak > 19.0);
    }

    #[test]
    fn test_shared_profile_update() {
        let shared = SharedProfile::default();
        let input = ProfileInput::percent_gait(50.4);
        assert_eq!(shared.torque(&input), NewtonMeter::ZERO);

        let other = shared.clone();
        other.update(&ProfileSettings::default()).unwrap();
        assert!((shared.torque(&input).0 - 20.0).abs() < 1e-9);

        // 失败的更新不影响已发布的曲线
        let bad = ProfileSettings::PercentGait(SplineSettings::default());
        assert!(shared.update(&bad).is_err());
        assert!((shared.torque(&input).0 - 20.0).abs() < 1e-9);
        assert_eq!(shared.load().name(), "percent_gait");

        shared.replace(Profile::default());
        assert_eq!(other.torque(&input), NewtonMeter::ZERO);
    }
}
