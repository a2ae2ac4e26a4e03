//! 腿侧定义
//!
//! 执行器安装在左腿或右腿，两侧电机转向相反。方向符号在设备初始化时确定，之后不再改变。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 腿侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LegSide {
    Left,
    Right,
}

impl LegSide {
    /// 方向符号：左腿 `+1`，右腿 `-1`
    #[inline]
    pub const fn direction(self) -> f64 {
        match self {
            LegSide::Left => 1.0,
            LegSide::Right => -1.0,
        }
    }

    /// 另一侧
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            LegSide::Left => LegSide::Right,
            LegSide::Right => LegSide::Left,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LegSide::Left => "left",
            LegSide::Right => "right",
        }
    }
}

impl fmt::Display for LegSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegSide {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(LegSide::Left),
            "right" | "r" => Ok(LegSide::Right),
            other => Err(ProtocolError::InvalidSide(other.to_string())),
        }
    }
}
