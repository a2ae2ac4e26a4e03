//! 控制循环性能指标
//!
//! 所有计数器都使用原子操作，可以在任何线程读取，不会与控制线程产生锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 控制循环实时指标
///
/// # 使用示例
///
/// ```rust
/// use exo_driver::RunnerMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = RunnerMetrics::new();
/// metrics.record_cycle(120);
/// metrics.read_errors.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.cycles_total, 1);
/// assert_eq!(snapshot.max_cycle_us, 120);
/// ```
#[derive(Debug, Default)]
pub struct RunnerMetrics {
    /// 已执行的周期数（含失败周期）
    pub cycles_total: AtomicU64,

    /// 成功下发的指令数（双腿模式下每周期两条）
    pub commands_sent: AtomicU64,

    /// 传感器读取失败次数
    pub read_errors: AtomicU64,

    /// 指令下发失败次数
    pub write_errors: AtomicU64,

    /// 超出周期预算的次数
    ///
    /// 持续增长说明控制频率过高或线程被抢占。
    pub overruns: AtomicU64,

    /// 电流饱和的指令数
    pub saturated_commands: AtomicU64,

    /// 有效脚跟着地事件数
    pub heelstrikes: AtomicU64,

    /// 单周期最大计算耗时（微秒）
    pub max_cycle_us: AtomicU64,

    /// 周期计算耗时累计（微秒）
    pub total_cycle_us: AtomicU64,
}

impl RunnerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个周期的计算耗时
    #[inline]
    pub fn record_cycle(&self, busy_us: u64) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.total_cycle_us.fetch_add(busy_us, Ordering::Relaxed);
        self.max_cycle_us.fetch_max(busy_us, Ordering::Relaxed);
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> RunnerMetricsSnapshot {
        RunnerMetricsSnapshot {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            saturated_commands: self.saturated_commands.load(Ordering::Relaxed),
            heelstrikes: self.heelstrikes.load(Ordering::Relaxed),
            max_cycle_us: self.max_cycle_us.load(Ordering::Relaxed),
            total_cycle_us: self.total_cycle_us.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.cycles_total.store(0, Ordering::Relaxed);
        self.commands_sent.store(0, Ordering::Relaxed);
        self.read_errors.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.overruns.store(0, Ordering::Relaxed);
        self.saturated_commands.store(0, Ordering::Relaxed);
        self.heelstrikes.store(0, Ordering::Relaxed);
        self.max_cycle_us.store(0, Ordering::Relaxed);
        self.total_cycle_us.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunnerMetricsSnapshot {
    pub cycles_total: u64,
    pub commands_sent: u64,
    pub read_errors: u64,
    pub write_errors: u64,
    pub overruns: u64,
    pub saturated_commands: u64,
    pub heelstrikes: u64,
    pub max_cycle_us: u64,
    pub total_cycle_us: u64,
}

impl RunnerMetricsSnapshot {
    /// 平均单周期计算耗时（微秒），没有周期时为 0
    pub fn avg_cycle_us(&self) -> f64 {
        if self.cycles_total == 0 {
            return 0.0;
        }
        self.total_cycle_us as f64 / self.cycles_total as f64
    }

    /// 饱和指令占比（百分比）
    pub fn saturation_rate(&self) -> f64 {
        if self.commands_sent == 0 {
            return 0.0;
        }
        (self.saturated_commands as f64 / self.commands_sent as f64) * 100.0
    }

    /// 超时周期占比（百分比）
    pub fn overrun_rate(&self) -> f64 {
        if self.cycles_total == 0 {
            return 0.0;
        }
        (self.overruns as f64 / self.cycles_total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_default() {
        let snapshot = RunnerMetrics::new().snapshot();
        assert_eq!(snapshot, RunnerMetricsSnapshot::default());
        assert_eq!(snapshot.avg_cycle_us(), 0.0);
        assert_eq!(snapshot.saturation_rate(), 0.0);
    }

    #[test]
    fn test_record_cycle() {
        let metrics = RunnerMetrics::new();
        metrics.record_cycle(100);
        metrics.record_cycle(300);
        metrics.record_cycle(200);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles_total, 3);
        assert_eq!(snapshot.max_cycle_us, 300);
        assert!((snapshot.avg_cycle_us() - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_rates() {
        let metrics = RunnerMetrics::new();
        metrics.commands_sent.fetch_add(200, Ordering::Relaxed);
        metrics.saturated_commands.fetch_add(50, Ordering::Relaxed);
        metrics.cycles_total.fetch_add(100, Ordering::Relaxed);
        metrics.overruns.fetch_add(1, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert!((snapshot.saturation_rate() - 25.0).abs() < 1e-12);
        assert!((snapshot.overrun_rate() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = RunnerMetrics::new();
        metrics.record_cycle(50);
        metrics.read_errors.fetch_add(3, Ordering::Relaxed);
        metrics.reset();
        assert_eq!(metrics.snapshot(), RunnerMetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_concurrent() {
        let metrics = Arc::new(RunnerMetrics::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let m = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.record_cycle(i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles_total, 1000);
        assert_eq!(snapshot.max_cycle_us, 9);
    }
}
