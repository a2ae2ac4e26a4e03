//! # 安全配置
//!
//! 全局安全限制，作用于所有设备，优先级高于单台设备的标定参数。

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// 安全限制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    /// 最大电机电流（A）
    pub max_current_a: f64,

    /// 最大关节力矩指令（N·m）
    pub max_torque_nm: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_current_a: 25.0,
            max_torque_nm: 60.0,
        }
    }
}

impl SafetyLimits {
    /// 检查电流是否在限制内
    pub fn check_current(&self, current_a: f64) -> bool {
        current_a.is_finite() && current_a.abs() <= self.max_current_a
    }

    /// 检查力矩是否在限制内
    pub fn check_torque(&self, torque_nm: f64) -> bool {
        torque_nm.is_finite() && torque_nm.abs() <= self.max_torque_nm
    }

    /// 将力矩钳位到 `±max_torque_nm`，非有限值返回 0
    pub fn clamp_torque(&self, torque_nm: f64) -> f64 {
        if !torque_nm.is_finite() {
            return 0.0;
        }
        torque_nm.clamp(-self.max_torque_nm, self.max_torque_nm)
    }

    /// 设备电流限制不得超过全局限制
    pub fn clamp_current_limit(&self, device_limit_a: f64) -> f64 {
        device_limit_a.min(self.max_current_a)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_current_a > 0.0 && self.max_current_a.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "safety.max_current_a",
                reason: format!("{} must be > 0", self.max_current_a),
            });
        }
        if !(self.max_torque_nm > 0.0 && self.max_torque_nm.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "safety.max_torque_nm",
                reason: format!("{} must be > 0", self.max_torque_nm),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_limits() {
        let limits = SafetyLimits::default();
        assert!(limits.check_current(24.9));
        assert!(limits.check_current(-25.0));
        assert!(!limits.check_current(25.1));
        assert!(!limits.check_current(f64::NAN));
        assert!(limits.check_torque(-59.0));
        assert!(!limits.check_torque(f64::INFINITY));
    }

    #[test]
    fn test_clamp_torque() {
        let limits = SafetyLimits {
            max_current_a: 10.0,
            max_torque_nm: 30.0,
        };
        assert_eq!(limits.clamp_torque(45.0), 30.0);
        assert_eq!(limits.clamp_torque(-45.0), -30.0);
        assert_eq!(limits.clamp_torque(12.0), 12.0);
        assert_eq!(limits.clamp_torque(f64::NAN), 0.0);
        assert_eq!(limits.clamp_current_limit(25.0), 10.0);
        assert_eq!(limits.clamp_current_limit(5.0), 5.0);
    }

    #[test]
    fn test_validate() {
        assert!(SafetyLimits::default().validate().is_ok());
        let limits = SafetyLimits {
            max_current_a: 0.0,
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }
}
