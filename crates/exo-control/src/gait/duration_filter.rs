//! 自适应时长滤波器
//!
//! 步幅和支撑相共用同一套逻辑：
//!
//! ```text
//! 缓冲区未满（自举）：无条件接受
//! 缓冲区已满：lower_ratio × min ≤ d ≤ upper_ratio × max 才接受，接受后 FIFO 挤出最旧样本
//! 期望时长 = 缓冲区均值
//! ```
//!
//! 非正时长（重复时间戳、时钟回退）总是被拒绝；设置了绝对上限时，
//! 超过上限的时长在自举阶段同样被拒绝。

use std::collections::VecDeque;

/// 单次输入的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// 已接受并更新期望时长
    Accepted,
    /// 超出历史极值范围
    Outlier,
    /// 非正时长
    NonPositive,
}

impl FilterOutcome {
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, FilterOutcome::Accepted)
    }
}

/// 固定容量的时长历史与均值估计
#[derive(Debug, Clone)]
pub struct DurationFilter {
    history: VecDeque<u64>,
    capacity: usize,
    lower_ratio: f64,
    upper_ratio: f64,
    max_ms: Option<u64>,
    expected_ms: Option<f64>,
}

impl DurationFilter {
    /// 创建滤波器
    ///
    /// `capacity` 为 0 时按 1 处理。
    pub fn new(capacity: usize, lower_ratio: f64, upper_ratio: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            lower_ratio,
            upper_ratio,
            max_ms: None,
            expected_ms: None,
        }
    }

    /// 设置绝对上限（毫秒），超过者作为异常值拒绝
    #[must_use]
    pub fn with_max_duration(mut self, max_ms: u64) -> Self {
        self.max_ms = Some(max_ms);
        self
    }

    pub fn max_duration(&self) -> Option<u64> {
        self.max_ms
    }

    /// 输入一个新时长（毫秒）
    pub fn push(&mut self, duration_ms: u64) -> FilterOutcome {
        if duration_ms == 0 {
            return FilterOutcome::NonPositive;
        }

        if matches!(self.max_ms, Some(max) if duration_ms > max) {
            return FilterOutcome::Outlier;
        }

        if self.is_full() && !self.within_bounds(duration_ms) {
            return FilterOutcome::Outlier;
        }

        if self.is_full() {
            self.history.pop_front();
        }
        self.history.push_back(duration_ms);

        let sum: f64 = self.history.iter().map(|&d| d as f64).sum();
        self.expected_ms = Some(sum / self.history.len() as f64);
        FilterOutcome::Accepted
    }

    /// 相对当前缓冲区极值的可接受区间
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let min = *self.history.iter().min()?;
        let max = *self.history.iter().max()?;
        Some((
            self.lower_ratio * min as f64,
            self.upper_ratio * max as f64,
        ))
    }

    fn within_bounds(&self, duration_ms: u64) -> bool {
        match self.bounds() {
            Some((lo, hi)) => {
                let d = duration_ms as f64;
                d >= lo && d <= hi
            },
            None => true,
        }
    }

    /// 期望时长（毫秒），至少接受过一个样本后才有定义
    #[inline]
    pub fn expected_ms(&self) -> Option<f64> {
        self.expected_ms
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.history.len() >= self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 历史样本（从旧到新）
    pub fn history(&self) -> impl Iterator<Item = u64> + '_ {
        self.history.iter().copied()
    }

    /// 清空历史，期望时长回到未定义
    pub fn clear(&mut self) {
        self.history.clear();
        self.expected_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> DurationFilter {
        DurationFilter::new(10, 0.25, 1.75)
    }

    #[test]
    fn test_identical_durations_set_expected() {
        let mut f = filter();
        assert_eq!(f.expected_ms(), None);
        for _ in 0..10 {
            assert_eq!(f.push(1000), FilterOutcome::Accepted);
        }
        assert!(f.is_full());
        assert_eq!(f.expected_ms(), Some(1000.0));
    }

    #[test]
    fn test_outlier_rejected_after_full() {
        let mut f = filter();
        for _ in 0..10 {
            f.push(1000);
        }
        assert_eq!(f.push(5000), FilterOutcome::Outlier);
        assert_eq!(f.push(200), FilterOutcome::Outlier);
        assert_eq!(f.expected_ms(), Some(1000.0));
        assert_eq!(f.len(), 10);

        // 边界值可接受
        assert_eq!(f.push(1750), FilterOutcome::Accepted);
        assert_eq!(f.expected_ms(), Some(1075.0));
    }

    #[test]
    fn test_bootstrap_accepts_everything() {
        let mut f = filter();
        assert!(f.push(1000).is_accepted());
        assert!(f.push(9000).is_accepted());
        assert_eq!(f.expected_ms(), Some(5000.0));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut f = DurationFilter::new(3, 0.25, 1.75);
        f.push(1000);
        f.push(1100);
        f.push(1200);
        f.push(1300);
        assert_eq!(f.history().collect::<Vec<_>>(), vec![1100, 1200, 1300]);
        assert_eq!(f.expected_ms(), Some(1200.0));
    }

    #[test]
    fn test_max_duration_applies_during_bootstrap() {
        let mut f = filter().with_max_duration(3000);
        assert_eq!(f.max_duration(), Some(3000));
        assert_eq!(f.push(u64::MAX), FilterOutcome::Outlier);
        assert_eq!(f.push(3001), FilterOutcome::Outlier);
        assert!(f.is_empty());
        assert_eq!(f.expected_ms(), None);

        assert!(f.push(3000).is_accepted());
        assert!(f.push(1000).is_accepted());
        assert_eq!(f.expected_ms(), Some(2000.0));
    }

    #[test]
    fn test_huge_durations_do_not_overflow_mean() {
        let mut f = filter();
        f.push(u64::MAX);
        f.push(u64::MAX);
        assert_eq!(f.expected_ms(), Some(u64::MAX as f64));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut f = filter();
        assert_eq!(f.push(0), FilterOutcome::NonPositive);
        assert!(f.is_empty());
        assert_eq!(f.expected_ms(), None);
    }

    #[test]
    fn test_clear() {
        let mut f = filter();
        f.push(800);
        f.clear();
        assert!(f.is_empty());
        assert_eq!(f.expected_ms(), None);
        assert_eq!(f.bounds(), None);
    }
}
