//! # Exo Tools - 共享配置与工具
//!
//! **依赖原则**: 只依赖 `exo-protocol`，避免依赖 `exo-control`
//!
//! ## 包含模块
//!
//! - `config` - TOML 配置（纯数据结构）
//! - `safety` - 全局安全限制
//! - `statistics` - 统计算法（纯函数，可选）
//!
//! ## Feature Flags
//!
//! - `default` - 无默认 features
//! - `full` - 启用所有功能（包含 statistics）
//! - `statistics` - 启用统计模块
//!
//! ## 使用示例
//!
//! ```toml
//! # apps/cli/Cargo.toml - 需要统计
//! [dependencies]
//! exo-tools = { workspace = true, features = ["full"] }
//! ```

pub mod config;
pub mod safety;

// ⭐ 可选模块（通过 feature flags 控制）
#[cfg(feature = "statistics")]
pub mod statistics;

// 重新导出常用类型
pub use config::{
    ConfigError, DeviceSettings, EstimatorSettings, ExoConfig, LoopSettings, ProfileSettings,
    SplineSettings, TransmissionSettings,
};
pub use safety::SafetyLimits;
