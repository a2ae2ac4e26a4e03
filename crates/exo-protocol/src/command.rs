//! 执行器指令
//!
//! 设备接受带符号的整数毫安电流指令。方向符号与饱和在控制核心中已处理，此处只做单位封装。

use crate::units::Amp;
use std::fmt;

/// 电机电流指令（毫安，带符号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrentCommand {
    pub milliamps: i32,
}

impl CurrentCommand {
    /// 零电流（不提供助力）
    pub const ZERO: Self = CurrentCommand { milliamps: 0 };

    #[inline]
    pub const fn from_milliamps(milliamps: i32) -> Self {
        Self { milliamps }
    }

    /// 从安培构造，非有限值视为 0
    #[inline]
    pub fn from_amps(current: Amp) -> Self {
        Self {
            milliamps: current.to_milliamps(),
        }
    }

    #[inline]
    pub fn as_amps(self) -> Amp {
        Amp::from_milliamps(self.milliamps)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.milliamps == 0
    }
}

impl fmt::Display for CurrentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mA", self.milliamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_amps() {
        assert_eq!(CurrentCommand::from_amps(Amp(2.5)).milliamps, 2500);
        assert_eq!(CurrentCommand::from_amps(Amp(f64::NAN)), CurrentCommand::ZERO);
        assert!(CurrentCommand::ZERO.is_zero());
        assert_eq!(CurrentCommand::from_milliamps(-300).as_amps(), Amp(-0.3));
    }
}
