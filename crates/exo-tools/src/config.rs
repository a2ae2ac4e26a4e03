//! # 控制配置
//!
//! 外骨骼控制系统的全部可调参数，以 TOML 文件形式保存。
//!
//! # 文件结构
//!
//! ```toml
//! [estimator]
//! heelstrike_arm_threshold = 150.0
//! armed_duration_percent = 10.0
//! history_len = 10
//! gyro_axis = "z"
//!
//! [profile]
//! kind = "percent_gait"
//! t0 = 0.0
//! t1 = 27.1
//! t2 = 50.4
//! t3 = 62.7
//! onset_torque_nm = 2.0
//! peak_torque_normalized = 0.2
//! user_mass_kg = 100.0
//!
//! [loop]
//! frequency_hz = 500.0
//!
//! [devices.left]
//! side = "left"
//! poly0 = 14.0
//! ```
//!
//! # 设计
//!
//! - 所有结构都是纯数据（POD），可序列化，不包含运行时状态
//! - 曲线参数的每个字段都是 `Option`，缺失的字段在构建曲线时报告为 `MissingParameter`
//! - 配置文件缺省路径：
//!   - Linux/macOS: `~/.config/exo/config.toml`
//!   - Windows: `%APPDATA%\exo\config.toml`

use crate::safety::SafetyLimits;
use exo_protocol::{GyroAxis, LegSide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("Config file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 配置值不合法
    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// 找不到设备
    #[error("Unknown device id: {0}")]
    UnknownDevice(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// 相位估计器参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// 脚跟着地检测的上阈值（rad/s），角速度上穿此值时上膛
    pub heelstrike_arm_threshold: f64,

    /// 脚跟着地检测的触发阈值（rad/s），角速度下穿此值时触发
    ///
    /// `None` 表示与上膛阈值相同（标准 Schmitt 触发器）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heelstrike_trigger_threshold: Option<f64>,

    /// 有效事件的最短上膛时长（占期望步幅的百分比）
    pub armed_duration_percent: f64,

    /// 步幅/支撑相历史缓冲区容量
    pub history_len: usize,

    /// 异常时长下界系数（相对历史最小值）
    pub lower_ratio: f64,

    /// 异常时长上界系数（相对历史最大值）
    pub upper_ratio: f64,

    /// 步幅/支撑相时长绝对上限（毫秒），自举阶段同样生效
    pub max_stride_ms: u64,

    /// 用于步态检测的陀螺仪轴
    pub gyro_axis: GyroAxis,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            heelstrike_arm_threshold: 150.0,
            heelstrike_trigger_threshold: None,
            armed_duration_percent: 10.0,
            history_len: 10,
            lower_ratio: 0.25,
            upper_ratio: 1.75,
            max_stride_ms: 3000,
            gyro_axis: GyroAxis::Z,
        }
    }
}

impl EstimatorSettings {
    /// 实际使用的触发阈值
    pub fn trigger_threshold(&self) -> f64 {
        self.heelstrike_trigger_threshold
            .unwrap_or(self.heelstrike_arm_threshold)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.heelstrike_arm_threshold.is_finite() {
            return Err(invalid("estimator.heelstrike_arm_threshold", "must be finite"));
        }
        let trigger = self.trigger_threshold();
        if !trigger.is_finite() || trigger > self.heelstrike_arm_threshold {
            return Err(invalid(
                "estimator.heelstrike_trigger_threshold",
                format!(
                    "{} must be finite and <= arm threshold {}",
                    trigger, self.heelstrike_arm_threshold
                ),
            ));
        }
        if !(0.0..100.0).contains(&self.armed_duration_percent) {
            return Err(invalid(
                "estimator.armed_duration_percent",
                format!("{} not in [0, 100)", self.armed_duration_percent),
            ));
        }
        if self.history_len == 0 {
            return Err(invalid("estimator.history_len", "must be > 0"));
        }
        if !(self.lower_ratio > 0.0 && self.lower_ratio <= 1.0) {
            return Err(invalid(
                "estimator.lower_ratio",
                format!("{} not in (0, 1]", self.lower_ratio),
            ));
        }
        if !(self.upper_ratio >= 1.0 && self.upper_ratio.is_finite()) {
            return Err(invalid(
                "estimator.upper_ratio",
                format!("{} must be finite and >= 1", self.upper_ratio),
            ));
        }
        if self.max_stride_ms == 0 {
            return Err(invalid("estimator.max_stride_ms", "must be > 0"));
        }
        Ok(())
    }
}

/// 样条助力曲线参数
///
/// 断点单位为百分比（步态百分比或支撑相百分比，取决于曲线类型）。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t3: Option<f64>,
    /// 起始力矩（N·m）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_torque_nm: Option<f64>,
    /// 归一化峰值力矩（N·m/kg）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_torque_normalized: Option<f64>,
    /// 用户体重（kg）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_mass_kg: Option<f64>,
}

impl SplineSettings {
    /// 步态百分比曲线的参考参数（Zhang et al. 2017）
    pub fn percent_gait_reference() -> Self {
        Self {
            t0: Some(0.0),
            t1: Some(27.1),
            t2: Some(50.4),
            t3: Some(62.7),
            onset_torque_nm: Some(2.0),
            peak_torque_normalized: Some(0.2),
            user_mass_kg: Some(100.0),
        }
    }

    /// 支撑相百分比曲线的参考参数（Witte et al. 2020）
    pub fn percent_stance_reference() -> Self {
        Self {
            t0: Some(0.0),
            t1: Some(22.91),
            t2: Some(75.71),
            t3: Some(96.46),
            onset_torque_nm: Some(4.0),
            peak_torque_normalized: Some(0.15),
            user_mass_kg: Some(100.0),
        }
    }
}

/// 力矩曲线配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileSettings {
    /// 零力矩（透明模式）
    Zero,
    /// 线性弹簧
    Spring {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        neutral_angle_rad: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stiffness_nm_per_rad: Option<f64>,
    },
    /// 以步态百分比为自变量的样条曲线
    PercentGait(SplineSettings),
    /// 以支撑相百分比为自变量的样条曲线（断点间距至少 20 个百分点）
    PercentStance(SplineSettings),
}

impl Default for ProfileSettings {
    fn default() -> Self {
        ProfileSettings::PercentGait(SplineSettings::percent_gait_reference())
    }
}

impl ProfileSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            ProfileSettings::Zero => "zero",
            ProfileSettings::Spring { .. } => "spring",
            ProfileSettings::PercentGait(_) => "percent_gait",
            ProfileSettings::PercentStance(_) => "percent_stance",
        }
    }
}

/// 执行器传动参数（每台设备单独标定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionSettings {
    /// 电机角对关节角导数的四次多项式系数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly4: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly0: Option<f64>,

    /// 电机力矩常数（N·m/A）
    #[serde(default = "default_kt")]
    pub kt_nm_per_a: f64,

    /// 电流饱和限制（A）
    #[serde(default = "default_current_limit")]
    pub current_limit_a: f64,

    /// 时间基准建立后的最小助力方向电流（A），保持绑带张紧；0 表示关闭
    #[serde(default)]
    pub pretension_current_a: f64,
}

fn default_kt() -> f64 {
    0.048
}

fn default_current_limit() -> f64 {
    25.0
}

impl Default for TransmissionSettings {
    /// 示例系数，实际设备需离线标定后写入配置文件
    fn default() -> Self {
        Self {
            poly4: Some(0.0),
            poly3: Some(0.0),
            poly2: Some(-2.0),
            poly1: Some(-6.0),
            poly0: Some(14.0),
            kt_nm_per_a: default_kt(),
            current_limit_a: default_current_limit(),
            pretension_current_a: 0.0,
        }
    }
}

/// 单台设备配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    pub side: LegSide,
    #[serde(flatten)]
    pub transmission: TransmissionSettings,
}

/// 控制循环参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// 控制频率（Hz）
    pub frequency_hz: f64,
    /// 连续读取失败多少次后停止循环
    pub max_consecutive_errors: u32,
    /// 是否提升控制线程优先级（需要 `realtime` feature）
    pub realtime: bool,
    /// 快照录制通道容量
    pub recording_capacity: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 500.0,
            max_consecutive_errors: 5,
            realtime: false,
            recording_capacity: 100_000,
        }
    }
}

/// 顶层配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExoConfig {
    #[serde(default)]
    pub estimator: EstimatorSettings,

    #[serde(default)]
    pub profile: ProfileSettings,

    #[serde(default, rename = "loop")]
    pub control_loop: LoopSettings,

    #[serde(default)]
    pub safety: SafetyLimits,

    /// 设备 ID → 设备配置
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceSettings>,
}

impl Default for ExoConfig {
    fn default() -> Self {
        let mut devices = BTreeMap::new();
        devices.insert(
            "left".to_string(),
            DeviceSettings {
                side: LegSide::Left,
                transmission: TransmissionSettings::default(),
            },
        );
        devices.insert(
            "right".to_string(),
            DeviceSettings {
                side: LegSide::Right,
                transmission: TransmissionSettings::default(),
            },
        );
        Self {
            estimator: EstimatorSettings::default(),
            profile: ProfileSettings::default(),
            control_loop: LoopSettings::default(),
            safety: SafetyLimits::default(),
            devices,
        }
    }
}

impl ExoConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件（父目录不存在时自动创建）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 按设备 ID 查找
    pub fn device(&self, id: &str) -> Result<&DeviceSettings, ConfigError> {
        self.devices
            .get(id)
            .ok_or_else(|| ConfigError::UnknownDevice(id.to_string()))
    }

    /// 按腿侧查找第一台设备
    pub fn device_for_side(&self, side: LegSide) -> Option<(&str, &DeviceSettings)> {
        self.devices
            .iter()
            .find(|(_, d)| d.side == side)
            .map(|(id, d)| (id.as_str(), d))
    }

    /// 设备电流限制与全局安全限制中较小者（A）
    pub fn effective_current_limit(&self, device: &DeviceSettings) -> f64 {
        self.safety
            .clamp_current_limit(device.transmission.current_limit_a)
    }

    /// 校验所有数值字段
    ///
    /// 曲线参数的缺失不在此处报告：缺失字段在构建曲线时作为 `MissingParameter` 返回。
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.estimator.validate()?;
        self.safety.validate()?;

        let freq = self.control_loop.frequency_hz;
        if !(freq > 0.0 && freq.is_finite()) {
            return Err(invalid("loop.frequency_hz", format!("{freq} must be > 0")));
        }
        if self.control_loop.recording_capacity == 0 {
            return Err(invalid("loop.recording_capacity", "must be > 0"));
        }

        for device in self.devices.values() {
            let t = &device.transmission;
            if !(t.kt_nm_per_a > 0.0 && t.kt_nm_per_a.is_finite()) {
                return Err(invalid(
                    "devices.kt_nm_per_a",
                    format!("{} must be > 0", t.kt_nm_per_a),
                ));
            }
            if !(t.current_limit_a > 0.0 && t.current_limit_a.is_finite()) {
                return Err(invalid(
                    "devices.current_limit_a",
                    format!("{} must be > 0", t.current_limit_a),
                ));
            }
            let pretension = t.pretension_current_a;
            if !(pretension >= 0.0 && pretension <= t.current_limit_a) {
                return Err(invalid(
                    "devices.pretension_current_a",
                    format!("{} not in [0, {}]", pretension, t.current_limit_a),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExoConfig::default();
        config.validate().unwrap();
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.device("left").unwrap().side, LegSide::Left);
        assert_eq!(config.device_for_side(LegSide::Right).unwrap().0, "right");
    }

    #[test]
    fn test_toml_round_trip_preserves_profile() {
        let config = ExoConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("kind = \"percent_gait\""));
        let parsed = ExoConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_spline_settings() {
        // 缺失字段保持为 None，由曲线构建时报告
        let config = ExoConfig::from_toml_str(
            r#"
            [profile]
            kind = "percent_stance"
            t0 = 0.0
            t1 = 20.0
            "#,
        )
        .unwrap();
        match config.profile {
            ProfileSettings::PercentStance(s) => {
                assert_eq!(s.t1, Some(20.0));
                assert_eq!(s.t2, None);
            },
            other => panic!("unexpected profile {other:?}"),
        }
        // 未提供 [devices] 时为空
        assert!(config.devices.is_empty());
        assert!(matches!(
            config.device("left"),
            Err(ConfigError::UnknownDevice(_))
        ));
    }

    #[test]
    fn test_spring_and_zero_kinds() {
        let config = ExoConfig::from_toml_str(
            r#"
            [profile]
            kind = "spring"
            neutral_angle_rad = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(
            config.profile,
            ProfileSettings::Spring {
                neutral_angle_rad: Some(0.3),
                stiffness_nm_per_rad: None
            }
        );

        let config = ExoConfig::from_toml_str("[profile]\nkind = \"zero\"\n").unwrap();
        assert_eq!(config.profile.kind(), "zero");
    }

    #[test]
    fn test_device_defaults_and_flatten() {
        let config = ExoConfig::from_toml_str(
            r#"
            [devices.boot_a]
            side = "right"
            poly0 = 12.5
            "#,
        )
        .unwrap();
        let dev = config.device("boot_a").unwrap();
        assert_eq!(dev.side, LegSide::Right);
        assert_eq!(dev.transmission.poly0, Some(12.5));
        assert_eq!(dev.transmission.poly1, None);
        assert_eq!(dev.transmission.kt_nm_per_a, 0.048);
        assert_eq!(dev.transmission.current_limit_a, 25.0);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ExoConfig::default();
        config.estimator.history_len = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "estimator.history_len", .. })
        ));

        let mut config = ExoConfig::default();
        config.estimator.heelstrike_trigger_threshold = Some(200.0);
        assert!(config.validate().is_err());

        let mut config = ExoConfig::default();
        if let Some(dev) = config.devices.get_mut("right") {
            dev.transmission.pretension_current_a = 30.0;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "devices.pretension_current_a", .. })
        ));

        let mut config = ExoConfig::default();
        config.estimator.max_stride_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "estimator.max_stride_ms", .. })
        ));

        let mut config = ExoConfig::default();
        config.control_loop.frequency_hz = 0.0;
        assert!(config.validate().is_err());

        let mut config = ExoConfig::default();
        if let Some(dev) = config.devices.get_mut("left") {
            dev.transmission.kt_nm_per_a = -1.0;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trigger_threshold_defaults_to_arm() {
        let mut settings = EstimatorSettings::default();
        assert_eq!(settings.trigger_threshold(), 150.0);
        settings.heelstrike_trigger_threshold = Some(0.0);
        assert_eq!(settings.trigger_threshold(), 0.0);
    }

    #[test]
    fn test_effective_current_limit() {
        let mut config = ExoConfig::default();
        config.safety.max_current_a = 10.0;
        let dev = config.device("left").unwrap().clone();
        assert_eq!(config.effective_current_limit(&dev), 10.0);
    }
}
