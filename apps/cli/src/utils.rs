//! 配置文件定位与加载

use anyhow::{Context, Result};
use exo_sdk::ExoConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// 默认配置文件路径：`<config_dir>/exo/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("无法确定配置目录")?;
    path.push("exo");
    path.push("config.toml");
    Ok(path)
}

/// 解析实际使用的配置文件路径
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// 加载配置
///
/// 显式指定的文件必须存在；默认路径下没有文件时使用内置默认配置。
pub fn load_config(explicit: Option<&Path>) -> Result<ExoConfig> {
    let path = resolve_config_path(explicit)?;

    if explicit.is_none() && !path.exists() {
        info!("No config at {}, using built-in defaults", path.display());
        return Ok(ExoConfig::default());
    }

    let config = ExoConfig::load_from_file(&path)
        .with_context(|| format!("加载配置文件失败: {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = ExoConfig::default();
        config.control_loop.frequency_hz = 250.0;
        config.save_to_file(&path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.control_loop.frequency_hz, 250.0);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = Path::new("/tmp/exo.toml");
        assert_eq!(resolve_config_path(Some(path)).unwrap(), path);
    }
}
