//! 强类型单位系统
//!
//! 使用 NewType 模式防止单位混淆，在编译期保证类型安全。
//!
//! # 设计目标
//!
//! - **编译期类型安全**: 防止 `Rad` 与 `Deg`、力矩与电流混用
//! - **零开销抽象**: NewType 编译后与原始类型性能相同
//! - **符合人体工程学**: 支持常用运算符重载
//!
//! # 示例
//!
//! ```rust
//! use exo_protocol::{Deg, NewtonMeter, Rad};
//!
//! let angle = Deg(90.0).to_rad();
//! assert!((angle.0 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
//!
//! let torque = NewtonMeter(2.0) * 3.0;
//! assert_eq!(torque, NewtonMeter(6.0));
//! ```

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 为浮点 NewType 生成通用实现
macro_rules! float_unit {
    ($name:ident, $suffix:literal) => {
        impl $name {
            /// 零值常量
            pub const ZERO: Self = $name(0.0);

            /// 创建新值
            #[inline]
            pub const fn new(value: f64) -> Self {
                $name(value)
            }

            /// 获取原始值
            #[inline]
            pub fn value(self) -> f64 {
                self.0
            }

            /// 取绝对值
            #[inline]
            pub fn abs(self) -> Self {
                $name(self.0.abs())
            }

            /// 是否为有限值（非 NaN / Inf）
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// 限制范围
            #[inline]
            pub fn clamp(self, min: Self, max: Self) -> Self {
                $name(self.0.clamp(min.0, max.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.4} {}", self.0, $suffix)
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $name(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $name(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $name(self.0 * rhs)
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $name(-self.0)
            }
        }
    };
}

/// 弧度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rad(pub f64);

float_unit!(Rad, "rad");

impl Rad {
    /// 转换为角度
    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(self.0.to_degrees())
    }
}

/// 角度（NewType）
///
/// 设备原始读数以角度为单位，进入控制核心前统一转换为 [`Rad`]。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deg(pub f64);

float_unit!(Deg, "deg");

impl Deg {
    /// 转换为弧度
    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(self.0.to_radians())
    }
}

/// 角速度（rad/s）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadPerSec(pub f64);

float_unit!(RadPerSec, "rad/s");

/// 力矩（N·m）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewtonMeter(pub f64);

float_unit!(NewtonMeter, "Nm");

/// 电流（A）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Amp(pub f64);

float_unit!(Amp, "A");

impl Amp {
    /// 转换为毫安（四舍五入到整数，饱和到 i32 范围）
    ///
    /// 非有限值返回 0。
    #[inline]
    pub fn to_milliamps(self) -> i32 {
        if !self.0.is_finite() {
            return 0;
        }
        // `as` 对越界浮点数做饱和转换
        (self.0 * 1000.0).round() as i32
    }

    /// 从毫安构造
    #[inline]
    pub fn from_milliamps(ma: i32) -> Self {
        Amp(f64::from(ma) / 1000.0)
    }
}
