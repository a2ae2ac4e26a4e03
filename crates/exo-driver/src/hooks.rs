//! 钩子系统
//!
//! 每个周期下发指令成功后，把 [`CycleSnapshot`] 交给已注册的回调。
//!
//! # 设计原则
//!
//! - **非阻塞**: 回调运行在控制线程中，禁止 I/O 和锁，使用 Channel 转发
//! - **职责分离**: `LoopConfig` 保持为纯数据，回调由 `HookManager` 管理
//!
//! # 使用示例
//!
//! ```rust
//! use exo_control::CycleSnapshot;
//! use exo_driver::hooks::{HookManager, SnapshotCallback};
//! use exo_driver::recording::SnapshotRecorder;
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! let (recorder, rx) = SnapshotRecorder::new(16);
//! hooks.add_callback(Arc::new(recorder));
//!
//! hooks.trigger_all(&CycleSnapshot::default());
//! assert!(rx.try_recv().is_ok());
//! ```

use exo_control::CycleSnapshot;
use std::sync::Arc;

/// 快照回调
///
/// # 性能要求
///
/// - 必须在微秒级完成
/// - 推荐使用 `try_send` 而非 `send`
pub trait SnapshotCallback: Send + Sync {
    fn on_snapshot(&self, snapshot: &CycleSnapshot);
}

/// 钩子管理器
///
/// 回调列表本身不做同步，运行前注册完毕。
#[derive(Default, Clone)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn SnapshotCallback>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn SnapshotCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发所有回调（在控制线程中调用）
    pub fn trigger_all(&self, snapshot: &CycleSnapshot) {
        for callback in self.callbacks.iter() {
            callback.on_snapshot(snapshot);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
