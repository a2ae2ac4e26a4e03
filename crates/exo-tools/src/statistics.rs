//! # 统计工具
//!
//! 控制循环延迟与步态时长的统计分析（可选模块）
//!
//! 需要启用 `statistics` feature：
//! ```toml
//! exo-tools = { workspace = true, features = ["statistics"] }
//! ```

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// 控制周期延迟统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStatistics {
    /// 平均延迟（微秒）
    pub avg_latency_us: f64,

    /// 最小延迟（微秒）
    pub min_latency_us: u64,

    /// 最大延迟（微秒）
    pub max_latency_us: u64,

    /// 标准差（微秒）
    pub std_dev_us: f64,

    /// 中位数（微秒）
    pub p50_latency_us: f64,

    /// 99 分位（微秒）
    pub p99_latency_us: f64,

    /// 样本数量
    pub sample_count: u64,
}

impl LatencyStatistics {
    /// 计算延迟统计
    pub fn calculate(latencies: &[u64]) -> Self {
        if latencies.is_empty() {
            return Self {
                avg_latency_us: 0.0,
                min_latency_us: 0,
                max_latency_us: 0,
                std_dev_us: 0.0,
                p50_latency_us: 0.0,
                p99_latency_us: 0.0,
                sample_count: 0,
            };
        }

        let samples: Vec<f64> = latencies.iter().map(|&x| x as f64).collect();
        let mut ordered = Data::new(samples.clone());

        Self {
            avg_latency_us: samples.iter().mean(),
            min_latency_us: Iterator::min(latencies.iter().copied()).unwrap_or(0),
            max_latency_us: Iterator::max(latencies.iter().copied()).unwrap_or(0),
            std_dev_us: samples.iter().population_std_dev(),
            p50_latency_us: ordered.percentile(50),
            p99_latency_us: ordered.percentile(99),
            sample_count: latencies.len() as u64,
        }
    }

    /// 抖动（用标准差表示）
    pub fn jitter(&self) -> f64 {
        self.std_dev_us
    }

    /// 最大延迟是否在周期预算内
    pub fn within_budget(&self, budget_us: u64) -> bool {
        self.sample_count == 0 || self.max_latency_us <= budget_us
    }
}

/// 步幅时长统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrideStatistics {
    /// 平均步幅时长（毫秒）
    pub mean_ms: f64,

    /// 标准差（毫秒）
    pub std_dev_ms: f64,

    /// 变异系数（%）
    pub cv_percent: f64,

    /// 步频（步幅/分钟）
    pub cadence_per_min: f64,

    pub stride_count: usize,
}

impl StrideStatistics {
    /// 由步幅时长序列计算，空序列或存在非正时长时返回 `None`
    pub fn calculate(durations_ms: &[f64]) -> Option<Self> {
        if durations_ms.is_empty() || durations_ms.iter().any(|d| !(*d > 0.0)) {
            return None;
        }

        let mean = durations_ms.iter().mean();
        let std_dev = durations_ms.iter().population_std_dev();

        Some(Self {
            mean_ms: mean,
            std_dev_ms: std_dev,
            cv_percent: std_dev / mean * 100.0,
            cadence_per_min: 60_000.0 / mean,
            stride_count: durations_ms.len(),
        })
    }
}
