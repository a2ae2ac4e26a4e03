//! 控制层错误类型定义

use exo_tools::ConfigError;
use thiserror::Error;

/// 力矩曲线错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// 必需参数缺失，曲线拒绝重新计算系数
    #[error("Missing profile parameter: {0}")]
    MissingParameter(&'static str),

    /// 参数值不合法（非有限值、断点顺序错误等）
    #[error("Invalid profile parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// 曲线从未成功配置过
    #[error("Profile `{0}` is not configured")]
    NotConfigured(&'static str),
}

/// 传动模型错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransmissionError {
    #[error("Missing transmission coefficient: {0}")]
    MissingCoefficient(&'static str),

    #[error("Invalid transmission parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// 控制器构建错误
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ProfileError::MissingParameter("t2").to_string(),
            "Missing profile parameter: t2"
        );
        assert_eq!(
            ProfileError::NotConfigured("percent_gait").to_string(),
            "Profile `percent_gait` is not configured"
        );
        let err: ControlError = TransmissionError::InvalidParameter {
            name: "kt",
            value: 0.0,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Transmission error: Invalid transmission parameter `kt`: 0"
        );
    }
}
