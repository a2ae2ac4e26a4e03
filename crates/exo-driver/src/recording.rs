//! 异步快照录制
//!
//! # 设计原则
//!
//! - **Bounded Queue**: 有界通道防止 OOM
//! - **非阻塞**: 使用 `try_send`，队列满时丢弃新快照而非阻塞控制周期
//! - **丢帧监控**: 提供 `dropped_snapshots` 计数器
//!
//! 默认容量 100,000 个快照（约 3.3 分钟 @ 500Hz 单腿）。
//!
//! # 使用示例
//!
//! ```rust
//! use exo_driver::recording::SnapshotRecorder;
//!
//! let (recorder, rx) = SnapshotRecorder::with_default_capacity();
//! let dropped = recorder.dropped_snapshots().clone();
//!
//! std::thread::spawn(move || {
//!     while let Ok(snapshot) = rx.recv() {
//!         // 写入日志文件...
//!         let _ = snapshot;
//!     }
//! });
//!
//! println!("dropped {}", dropped.load(std::sync::atomic::Ordering::Relaxed));
//! ```

use crate::hooks::SnapshotCallback;
use crossbeam_channel::{Receiver, Sender, bounded};
use exo_control::CycleSnapshot;
use exo_protocol::LegSide;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 默认通道容量
pub const DEFAULT_RECORDING_CAPACITY: usize = 100_000;

/// 快照录制钩子
pub struct SnapshotRecorder {
    tx: Sender<CycleSnapshot>,
    /// 只录制这一侧（None 表示两侧都录）
    side: Option<LegSide>,
    dropped_snapshots: Arc<AtomicU64>,
    recorded_snapshots: Arc<AtomicU64>,
}

impl SnapshotRecorder {
    /// 创建录制钩子
    ///
    /// # 返回
    ///
    /// - `(recorder, rx)`: 钩子实例和接收端
    #[must_use]
    pub fn new(capacity: usize) -> (Self, Receiver<CycleSnapshot>) {
        let (tx, rx) = bounded(capacity);
        let recorder = Self {
            tx,
            side: None,
            dropped_snapshots: Arc::new(AtomicU64::new(0)),
            recorded_snapshots: Arc::new(AtomicU64::new(0)),
        };
        (recorder, rx)
    }

    #[must_use]
    pub fn with_default_capacity() -> (Self, Receiver<CycleSnapshot>) {
        Self::new(DEFAULT_RECORDING_CAPACITY)
    }

    /// 只录制指定腿侧的快照
    #[must_use]
    pub fn for_side(mut self, side: LegSide) -> Self {
        self.side = Some(side);
        self
    }

    /// 丢帧计数器（在注册前持有 `Arc` 引用）
    #[must_use]
    pub fn dropped_snapshots(&self) -> &Arc<AtomicU64> {
        &self.dropped_snapshots
    }

    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_snapshots.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn recorded_snapshots(&self) -> &Arc<AtomicU64> {
        &self.recorded_snapshots
    }

    #[must_use]
    pub fn recorded_count(&self) -> u64 {
        self.recorded_snapshots.load(Ordering::Relaxed)
    }
}

impl SnapshotCallback for SnapshotRecorder {
    #[inline]
    fn on_snapshot(&self, snapshot: &CycleSnapshot) {
        if let Some(side) = self.side
            && snapshot.side != Some(side)
        {
            return;
        }
        // ⚠️ 缓冲区满时丢弃新快照，保留旧快照
        if self.tx.try_send(*snapshot).is_err() {
            self.dropped_snapshots.fetch_add(1, Ordering::Relaxed);
        } else {
            self.recorded_snapshots.fetch_add(1, Ordering::Relaxed);
        }
    }
}
