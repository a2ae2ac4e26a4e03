//! 零斜率 Hermite 三次段
//!
//! 在 `[x0, x1]` 上求 `p(x) = a·x³ + b·x² + c·x + d`，满足：
//!
//! ```text
//! p(x0) = y0, p(x1) = y1, p'(x0) = 0, p'(x1) = 0
//! ```
//!
//! 记 `D = (x0 - x1)³`，闭式解为：
//!
//! ```text
//! a = 2(y1 - y0) / D
//! b = -3(x0 + x1)(y1 - y0) / D
//! c = 6·x0·x1·(y1 - y0) / D
//! d = (x0³·y1 - 3·x0²·x1·y1 + 3·x0·x1²·y0 - x1³·y0) / D
//! ```
//!
//! 系数在参数变化时计算一次，控制周期内只做求值。

/// 三次多项式系数
///
/// 表示 `p(x) = a·x³ + b·x² + c·x + d`，自变量为绝对相位（百分比），不做归一化。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CubicSegment {
    /// 求解零斜率 Hermite 段
    ///
    /// `x0 == x1` 或结果含非有限值时返回 `None`。
    pub fn hermite(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Self> {
        let dx = x0 - x1;
        if dx == 0.0 {
            return None;
        }
        let denom = dx * dx * dx;
        let dy = y1 - y0;

        let segment = Self {
            a: 2.0 * dy / denom,
            b: -3.0 * (x0 + x1) * dy / denom,
            c: 6.0 * x0 * x1 * dy / denom,
            d: (x0.powi(3) * y1 - 3.0 * x0 * x0 * x1 * y1 + 3.0 * x0 * x1 * x1 * y0
                - x1.powi(3) * y0)
                / denom,
        };

        segment.is_finite().then_some(segment)
    }

    /// 求值（Horner 形式）
    #[inline]
    pub fn value(&self, x: f64) -> f64 {
        ((self.a * x + self.b) * x + self.c) * x + self.d
    }

    /// 一阶导数
    #[inline]
    pub fn slope(&self, x: f64) -> f64 {
        (3.0 * self.a * x + 2.0 * self.b) * x + self.c
    }

    fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }
}
