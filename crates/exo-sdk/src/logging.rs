//! 日志初始化
//!
//! 库内统一使用 `tracing`；依赖 `log` 的第三方库经 `tracing-log` 桥接。
//! 过滤规则优先读取 `RUST_LOG`，否则使用传入的默认值。

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to bridge log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),

    #[error("Global subscriber already set: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// 安装全局日志订阅者
///
/// # 参数
///
/// - `default_filter`: `RUST_LOG` 未设置时的过滤规则，如 `"info"` 或 `"exo_control=debug"`
pub fn try_init_logger(default_filter: &str) -> Result<(), LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// 以 `info` 级别安装日志，已安装时静默忽略
pub fn init_logger() {
    if let Err(e) = try_init_logger("info") {
        tracing::debug!("Logger not installed: {}", e);
    }
}
