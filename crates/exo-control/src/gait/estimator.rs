//! 相位估计器
//!
//! 每条腿一个实例，独占自己的 [`GaitState`]。
//!
//! # 流程（每个采样周期）
//!
//! ```text
//! (timestamp, gyro) ─┬─> 脚跟着地触发器 ─> 有效性检查 ─> 步幅滤波器
//!                    ├─> 脚尖离地触发器 ─> 有效性检查 ─> 支撑相滤波器
//!                    └─> percent_gait / percent_stance
//! ```
//!
//! 有效性检查：上膛时长必须大于 `armed_duration_percent / 100 × 期望步幅`。
//! 期望步幅未定义时阈值为 0，任何正的上膛时长都有效，用于自举时间基准。

use super::duration_filter::{DurationFilter, FilterOutcome};
use super::trigger::{HysteresisTrigger, TriggerFire};
use crate::error::ControlError;
use exo_protocol::RadPerSec;
use exo_tools::EstimatorSettings;
use tracing::debug;

/// 支撑相百分比
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "phase", content = "percent", rename_all = "snake_case")
)]
pub enum StancePhase {
    /// 尚无脚跟着地或期望支撑时长未定义
    #[default]
    Undefined,
    /// 支撑相内，0–100
    Stance(f64),
    /// 摆动相
    Swing,
}

impl StancePhase {
    /// 支撑相内的百分比，其余情况为 `None`
    #[inline]
    pub fn percent(self) -> Option<f64> {
        match self {
            StancePhase::Stance(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn is_swing(self) -> bool {
        matches!(self, StancePhase::Swing)
    }
}

/// 单个周期检测到的离散事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaitEvents {
    pub heelstrike: bool,
    pub toeoff: bool,
}

/// 诊断计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimatorCounters {
    pub heelstrikes: u64,
    pub toeoffs: u64,
    /// 上膛时间过短被丢弃的脚跟着地
    pub spurious_heelstrikes: u64,
    pub spurious_toeoffs: u64,
    /// 被滤波器拒绝的步幅时长
    pub rejected_strides: u64,
    pub rejected_stances: u64,
}

/// 单腿步态状态
#[derive(Debug, Clone)]
pub struct GaitState {
    heelstrike: HysteresisTrigger,
    toeoff: HysteresisTrigger,
    last_heelstrike: Option<u64>,
    previous_heelstrike: Option<u64>,
    last_toeoff: Option<u64>,
    previous_toeoff: Option<u64>,
    stride_history: DurationFilter,
    stance_history: DurationFilter,
    percent_gait: Option<f64>,
    percent_stance: StancePhase,
}

impl GaitState {
    fn new(settings: &EstimatorSettings) -> Self {
        Self {
            heelstrike: HysteresisTrigger::heelstrike(
                settings.heelstrike_arm_threshold,
                settings.trigger_threshold(),
            ),
            toeoff: HysteresisTrigger::toeoff(),
            last_heelstrike: None,
            previous_heelstrike: None,
            last_toeoff: None,
            previous_toeoff: None,
            // 支撑相是步幅的一部分，两者共用同一绝对上限
            stride_history: DurationFilter::new(
                settings.history_len,
                settings.lower_ratio,
                settings.upper_ratio,
            )
            .with_max_duration(settings.max_stride_ms),
            stance_history: DurationFilter::new(
                settings.history_len,
                settings.lower_ratio,
                settings.upper_ratio,
            )
            .with_max_duration(settings.max_stride_ms),
            percent_gait: None,
            percent_stance: StancePhase::Undefined,
        }
    }

    /// 重置所有状态（试次之间调用）
    pub fn clear(&mut self) {
        self.heelstrike.reset();
        self.toeoff.reset();
        self.last_heelstrike = None;
        self.previous_heelstrike = None;
        self.last_toeoff = None;
        self.previous_toeoff = None;
        self.stride_history.clear();
        self.stance_history.clear();
        self.percent_gait = None;
        self.percent_stance = StancePhase::Undefined;
    }

    pub fn heelstrike_armed(&self) -> bool {
        self.heelstrike.is_armed()
    }

    pub fn heelstrike_armed_timestamp(&self) -> Option<u64> {
        self.heelstrike.armed_at_ms()
    }

    pub fn toeoff_armed(&self) -> bool {
        self.toeoff.is_armed()
    }

    pub fn toeoff_armed_timestamp(&self) -> Option<u64> {
        self.toeoff.armed_at_ms()
    }

    pub fn last_heelstrike(&self) -> Option<u64> {
        self.last_heelstrike
    }

    pub fn previous_heelstrike(&self) -> Option<u64> {
        self.previous_heelstrike
    }

    pub fn last_toeoff(&self) -> Option<u64> {
        self.last_toeoff
    }

    pub fn previous_toeoff(&self) -> Option<u64> {
        self.previous_toeoff
    }

    pub fn stride_history(&self) -> &DurationFilter {
        &self.stride_history
    }

    pub fn stance_history(&self) -> &DurationFilter {
        &self.stance_history
    }

    pub fn expected_stride_ms(&self) -> Option<f64> {
        self.stride_history.expected_ms()
    }

    pub fn expected_stance_ms(&self) -> Option<f64> {
        self.stance_history.expected_ms()
    }
}

/// 相位估计器
#[derive(Debug, Clone)]
pub struct PhaseEstimator {
    armed_duration_fraction: f64,
    state: GaitState,
    counters: EstimatorCounters,
}

impl Default for PhaseEstimator {
    fn default() -> Self {
        let settings = EstimatorSettings::default();
        Self {
            armed_duration_fraction: settings.armed_duration_percent / 100.0,
            state: GaitState::new(&settings),
            counters: EstimatorCounters::default(),
        }
    }
}

impl PhaseEstimator {
    /// 按配置创建，配置不合法时返回错误
    pub fn new(settings: &EstimatorSettings) -> Result<Self, ControlError> {
        settings.validate()?;
        Ok(Self {
            armed_duration_fraction: settings.armed_duration_percent / 100.0,
            state: GaitState::new(settings),
            counters: EstimatorCounters::default(),
        })
    }

    /// 输入一个样本，返回本周期检测到的事件
    ///
    /// # 参数
    ///
    /// - `timestamp_ms`: 设备时间戳
    /// - `gyro`: 矢状面角速度
    pub fn update(&mut self, timestamp_ms: u64, gyro: RadPerSec) -> GaitEvents {
        let rate = gyro.0;
        let mut events = GaitEvents::default();

        if let Some(fire) = self.state.heelstrike.update(timestamp_ms, rate) {
            events.heelstrike = self.on_heelstrike(fire);
        }
        if let Some(fire) = self.state.toeoff.update(timestamp_ms, rate) {
            events.toeoff = self.on_toeoff(fire);
        }

        self.state.percent_gait = self.calc_percent_gait(timestamp_ms);
        self.state.percent_stance = self.calc_percent_stance(timestamp_ms);
        events
    }

    /// 事件有效所需的最短上膛时长
    fn min_armed_duration_ms(&self) -> f64 {
        self.state
            .expected_stride_ms()
            .map_or(0.0, |expected| self.armed_duration_fraction * expected)
    }

    fn on_heelstrike(&mut self, fire: TriggerFire) -> bool {
        let armed = fire.armed_duration_ms();
        let min = self.min_armed_duration_ms();
        if armed as f64 <= min {
            self.counters.spurious_heelstrikes += 1;
            debug!(
                "Spurious heelstrike at {} ms: armed {} ms <= {:.1} ms",
                fire.fired_at_ms, armed, min
            );
            return false;
        }

        let now = fire.fired_at_ms;
        self.state.previous_heelstrike = self.state.last_heelstrike;
        self.state.last_heelstrike = Some(now);
        self.counters.heelstrikes += 1;

        if let Some(previous) = self.state.previous_heelstrike {
            let stride = now.saturating_sub(previous);
            if self.state.stride_history.push(stride) != FilterOutcome::Accepted {
                self.counters.rejected_strides += 1;
                debug!(
                    "Rejected stride duration {} ms (bounds {:?})",
                    stride,
                    self.state.stride_history.bounds()
                );
            }
        }
        true
    }

    fn on_toeoff(&mut self, fire: TriggerFire) -> bool {
        let armed = fire.armed_duration_ms();
        let min = self.min_armed_duration_ms();
        if armed as f64 <= min {
            self.counters.spurious_toeoffs += 1;
            debug!(
                "Spurious toe-off at {} ms: armed {} ms <= {:.1} ms",
                fire.fired_at_ms, armed, min
            );
            return false;
        }

        let now = fire.fired_at_ms;
        self.state.previous_toeoff = self.state.last_toeoff;
        self.state.last_toeoff = Some(now);
        self.counters.toeoffs += 1;

        // 只有前面有脚跟着地时才能得到支撑相时长
        if let Some(heelstrike) = self.state.last_heelstrike
            && heelstrike < now
        {
            let stance = now - heelstrike;
            if self.state.stance_history.push(stance) != FilterOutcome::Accepted {
                self.counters.rejected_stances += 1;
                debug!(
                    "Rejected stance duration {} ms (bounds {:?})",
                    stance,
                    self.state.stance_history.bounds()
                );
            }
        }
        true
    }

    fn calc_percent_gait(&self, now: u64) -> Option<f64> {
        let heelstrike = self.state.last_heelstrike?;
        let expected = self.state.expected_stride_ms()?;
        let elapsed = now.saturating_sub(heelstrike) as f64;
        Some((100.0 * elapsed / expected).clamp(0.0, 100.0))
    }

    fn calc_percent_stance(&self, now: u64) -> StancePhase {
        let (Some(heelstrike), Some(expected)) =
            (self.state.last_heelstrike, self.state.expected_stance_ms())
        else {
            return StancePhase::Undefined;
        };

        if matches!(self.state.last_toeoff, Some(toeoff) if toeoff > heelstrike) {
            return StancePhase::Swing;
        }

        let percent = 100.0 * now.saturating_sub(heelstrike) as f64 / expected;
        if percent > 100.0 {
            StancePhase::Swing
        } else {
            StancePhase::Stance(percent)
        }
    }

    /// 当前步态百分比，期望步幅未定义时为 `None`
    #[inline]
    pub fn percent_gait(&self) -> Option<f64> {
        self.state.percent_gait
    }

    #[inline]
    pub fn percent_stance(&self) -> StancePhase {
        self.state.percent_stance
    }

    #[inline]
    pub fn expected_stride_ms(&self) -> Option<f64> {
        self.state.expected_stride_ms()
    }

    #[inline]
    pub fn expected_stance_ms(&self) -> Option<f64> {
        self.state.expected_stance_ms()
    }

    pub fn state(&self) -> &GaitState {
        &self.state
    }

    pub fn counters(&self) -> EstimatorCounters {
        self.counters
    }

    /// 重置步态状态和计数器
    pub fn clear(&mut self) {
        self.state.clear();
        self.counters = EstimatorCounters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 输入一次上膛时长为 `armed_ms` 的脚跟着地脉冲，返回触发时刻的事件
    fn pulse(est: &mut PhaseEstimator, start_ms: u64, armed_ms: u64) -> GaitEvents {
        est.update(start_ms, RadPerSec(200.0));
        est.update(start_ms + armed_ms, RadPerSec(100.0))
    }

    #[test]
    fn test_undefined_before_timebase() {
        let mut est = PhaseEstimator::default();
        for t in [0, 2, 4] {
            est.update(t, RadPerSec(10.0));
            assert_eq!(est.percent_gait(), None);
            assert_eq!(est.percent_stance(), StancePhase::Undefined);
        }
    }

    #[test]
    fn test_first_heelstrike_has_no_stride() {
        let mut est = PhaseEstimator::default();
        let events = pulse(&mut est, 0, 50);
        assert!(events.heelstrike);
        assert_eq!(est.state().last_heelstrike(), Some(50));
        assert_eq!(est.expected_stride_ms(), None);
        assert_eq!(est.percent_gait(), None);
    }

    #[test]
    fn test_second_heelstrike_sets_expected_stride() {
        let mut est = PhaseEstimator::default();
        pulse(&mut est, 0, 50);
        pulse(&mut est, 1000, 50);
        assert_eq!(est.state().previous_heelstrike(), Some(50));
        assert_eq!(est.state().last_heelstrike(), Some(1050));
        assert_eq!(est.expected_stride_ms(), Some(1000.0));

        est.update(1550, RadPerSec(0.0));
        assert!((est.percent_gait().unwrap() - 50.0).abs() < 1e-9);

        // 超过期望步幅后钳位在 100
        est.update(3000, RadPerSec(0.0));
        assert_eq!(est.percent_gait(), Some(100.0));
    }

    #[test]
    fn test_short_spike_rejected() {
        let mut est = PhaseEstimator::default();
        pulse(&mut est, 0, 300);
        pulse(&mut est, 1000, 300);
        assert_eq!(est.expected_stride_ms(), Some(1000.0));

        // 10% × 1000 = 100 ms，50 ms 的尖峰不是有效事件
        let events = pulse(&mut est, 1500, 50);
        assert!(!events.heelstrike);
        assert_eq!(est.state().last_heelstrike(), Some(1300));
        assert_eq!(est.state().stride_history().len(), 1);
        assert_eq!(est.counters().spurious_heelstrikes, 1);
    }

    #[test]
    fn test_outlier_stride_counted() {
        let settings = EstimatorSettings {
            history_len: 2,
            ..Default::default()
        };
        let mut est = PhaseEstimator::new(&settings).unwrap();
        pulse(&mut est, 0, 300);
        pulse(&mut est, 1000, 300);
        pulse(&mut est, 2000, 300);
        assert_eq!(est.expected_stride_ms(), Some(1000.0));

        // 5 倍步幅被拒绝，但仍作为最近一次脚跟着地
        pulse(&mut est, 7000, 300);
        assert_eq!(est.counters().rejected_strides, 1);
        assert_eq!(est.expected_stride_ms(), Some(1000.0));
        assert_eq!(est.state().last_heelstrike(), Some(7300));
    }

    #[test]
    fn test_toeoff_sets_stance_and_swing() {
        let mut est = PhaseEstimator::default();
        // 第一步：脚跟着地 @50
        pulse(&mut est, 0, 50);
        // 支撑相负角速度，600 ms 时过零
        est.update(100, RadPerSec(-50.0));
        let events = est.update(650, RadPerSec(5.0));
        assert!(events.toeoff);
        assert_eq!(est.expected_stance_ms(), Some(600.0));
        assert_eq!(est.percent_stance(), StancePhase::Swing);

        // 第二步：脚跟着地 @1050
        est.update(1000, RadPerSec(200.0));
        est.update(1050, RadPerSec(100.0));
        est.update(1350, RadPerSec(-10.0));
        assert_eq!(est.percent_stance(), StancePhase::Stance(50.0));
    }

    #[test]
    fn test_timestamp_glitch_does_not_poison_timebase() {
        let mut est = PhaseEstimator::default();
        pulse(&mut est, 0, 300);

        // 损坏的时间戳：触发时刻跳到 u64::MAX
        est.update(1000, RadPerSec(200.0));
        assert!(est.update(u64::MAX, RadPerSec(100.0)).heelstrike);
        assert_eq!(est.counters().rejected_strides, 1);
        assert_eq!(est.expected_stride_ms(), None);

        // 时钟回到正常值后第一步时长非正，随后恢复
        for start in [2000, 3000, 4000, 5000] {
            assert!(pulse(&mut est, start, 300).heelstrike);
        }
        assert_eq!(est.counters().rejected_strides, 2);
        assert_eq!(est.counters().spurious_heelstrikes, 0);
        assert_eq!(est.expected_stride_ms(), Some(1000.0));

        est.update(5800, RadPerSec(0.0));
        assert!((est.percent_gait().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_stride_above_max_rejected_during_bootstrap() {
        let settings = EstimatorSettings {
            max_stride_ms: 2000,
            ..Default::default()
        };
        let mut est = PhaseEstimator::new(&settings).unwrap();
        pulse(&mut est, 0, 300);
        // 长时间停顿后的第一步不进入历史
        pulse(&mut est, 5000, 300);
        assert_eq!(est.counters().rejected_strides, 1);
        assert_eq!(est.expected_stride_ms(), None);

        pulse(&mut est, 6000, 300);
        assert_eq!(est.expected_stride_ms(), Some(1000.0));
    }

    #[test]
    fn test_short_toeoff_rejected() {
        let mut est = PhaseEstimator::default();
        pulse(&mut est, 0, 300);
        est.update(400, RadPerSec(-50.0));
        assert!(est.update(900, RadPerSec(5.0)).toeoff);
        pulse(&mut est, 1000, 300);
        assert_eq!(est.expected_stride_ms(), Some(1000.0));
        assert_eq!(est.expected_stance_ms(), Some(600.0));

        // 上膛 50 ms，不超过 10% × 1000 ms
        est.update(1400, RadPerSec(-10.0));
        let events = est.update(1450, RadPerSec(5.0));
        assert!(!events.toeoff);

        let counters = est.counters();
        assert_eq!(counters.spurious_toeoffs, 1);
        assert_eq!(counters.toeoffs, 1);
        assert_eq!(est.state().last_toeoff(), Some(900));
        assert_eq!(est.state().stance_history().len(), 1);
        assert_eq!(est.percent_stance(), StancePhase::Stance(25.0));
    }

    #[test]
    fn test_toeoff_without_heelstrike_has_no_stance() {
        let mut est = PhaseEstimator::default();
        est.update(0, RadPerSec(-5.0));
        assert!(est.update(400, RadPerSec(5.0)).toeoff);
        assert_eq!(est.state().last_toeoff(), Some(400));
        assert_eq!(est.expected_stance_ms(), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut est = PhaseEstimator::default();
        pulse(&mut est, 0, 50);
        pulse(&mut est, 1000, 50);
        assert!(est.percent_gait().is_some());

        est.clear();
        assert_eq!(est.percent_gait(), None);
        assert_eq!(est.expected_stride_ms(), None);
        assert_eq!(est.state().last_heelstrike(), None);
        assert!(!est.state().heelstrike_armed());
        assert_eq!(est.counters(), EstimatorCounters::default());
    }

    #[test]
    fn test_invalid_settings() {
        let settings = EstimatorSettings {
            history_len: 0,
            ..Default::default()
        };
        assert!(matches!(
            PhaseEstimator::new(&settings),
            Err(ControlError::Config(_))
        ));

        let settings = EstimatorSettings {
            max_stride_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            PhaseEstimator::new(&settings),
            Err(ControlError::Config(_))
        ));
    }
}
