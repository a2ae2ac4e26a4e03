//! 迟滞触发器（Schmitt trigger）
//!
//! 两种方向：
//!
//! - [`TriggerKind::ArmAbove`]：信号 `>= arm` 时上膛，随后 `< fire` 时触发（脚跟着地）
//! - [`TriggerKind::ArmBelow`]：信号 `<= arm` 时上膛，随后 `> fire` 时触发（脚尖离地，过零检测）
//!
//! 触发时返回上膛持续时间，由调用方决定事件是否有效。

/// 触发方向与阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerKind {
    ArmAbove { arm: f64, fire: f64 },
    ArmBelow { arm: f64, fire: f64 },
}

/// 一次触发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerFire {
    pub armed_at_ms: u64,
    pub fired_at_ms: u64,
}

impl TriggerFire {
    /// 上膛持续时间（毫秒），时间戳回退时为 0
    #[inline]
    pub fn armed_duration_ms(&self) -> u64 {
        self.fired_at_ms.saturating_sub(self.armed_at_ms)
    }
}

#[derive(Debug, Clone)]
pub struct HysteresisTrigger {
    kind: TriggerKind,
    armed_at_ms: Option<u64>,
}

impl HysteresisTrigger {
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            armed_at_ms: None,
        }
    }

    /// 脚跟着地检测器
    pub fn heelstrike(arm_threshold: f64, trigger_threshold: f64) -> Self {
        Self::new(TriggerKind::ArmAbove {
            arm: arm_threshold,
            fire: trigger_threshold,
        })
    }

    /// 脚尖离地检测器（负到正过零）
    pub fn toeoff() -> Self {
        Self::new(TriggerKind::ArmBelow {
            arm: 0.0,
            fire: 0.0,
        })
    }

    /// 输入一个样本
    ///
    /// 同一样本只能上膛或触发其一。NaN 样本既不上膛也不触发。
    pub fn update(&mut self, timestamp_ms: u64, value: f64) -> Option<TriggerFire> {
        let (should_arm, should_fire) = match self.kind {
            TriggerKind::ArmAbove { arm, fire } => (value >= arm, value < fire),
            TriggerKind::ArmBelow { arm, fire } => (value <= arm, value > fire),
        };

        match self.armed_at_ms {
            None if should_arm => {
                self.armed_at_ms = Some(timestamp_ms);
                None
            },
            Some(armed_at_ms) if should_fire => {
                self.armed_at_ms = None;
                Some(TriggerFire {
                    armed_at_ms,
                    fired_at_ms: timestamp_ms,
                })
            },
            _ => None,
        }
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed_at_ms.is_some()
    }

    #[inline]
    pub fn armed_at_ms(&self) -> Option<u64> {
        self.armed_at_ms
    }

    pub fn reset(&mut self) {
        self.armed_at_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heelstrike_arm_and_fire() {
        let mut t = HysteresisTrigger::heelstrike(150.0, 150.0);
        assert_eq!(t.update(0, 100.0), None);
        assert!(!t.is_armed());
        assert_eq!(t.update(10, 160.0), None);
        assert_eq!(t.armed_at_ms(), Some(10));
        // 仍在阈值之上
        assert_eq!(t.update(20, 200.0), None);
        let fire = t.update(50, 120.0).unwrap();
        assert_eq!(fire.armed_at_ms, 10);
        assert_eq!(fire.armed_duration_ms(), 40);
        assert!(!t.is_armed());
    }

    #[test]
    fn test_separate_trigger_threshold() {
        let mut t = HysteresisTrigger::heelstrike(150.0, 0.0);
        t.update(0, 160.0);
        // 低于上膛阈值但仍高于触发阈值
        assert_eq!(t.update(10, 50.0), None);
        assert!(t.update(20, -1.0).is_some());
    }

    #[test]
    fn test_toeoff_zero_crossing() {
        let mut t = HysteresisTrigger::toeoff();
        assert_eq!(t.update(0, 5.0), None);
        assert_eq!(t.update(2, -3.0), None);
        assert!(t.is_armed());
        assert_eq!(t.update(4, 0.0), None);
        let fire = t.update(6, 0.5).unwrap();
        assert_eq!(fire.armed_duration_ms(), 4);
    }

    #[test]
    fn test_nan_is_ignored() {
        let mut t = HysteresisTrigger::heelstrike(150.0, 150.0);
        assert_eq!(t.update(0, f64::NAN), None);
        assert!(!t.is_armed());
        t.update(1, 151.0);
        assert_eq!(t.update(2, f64::NAN), None);
        assert!(t.is_armed());
    }

    #[test]
    fn test_backwards_timestamp() {
        let mut t = HysteresisTrigger::heelstrike(150.0, 150.0);
        t.update(100, 151.0);
        let fire = t.update(50, 0.0).unwrap();
        assert_eq!(fire.armed_duration_ms(), 0);
    }
}
