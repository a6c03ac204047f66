//! 配置文件定位
//!
//! 优先级：`--config` > `~/.config/rover/config.toml` > 默认值；`--host` 最后覆盖。

use anyhow::{Context, Result};
use rover_sdk::RoverConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rover").join("config.toml"))
}

/// 解析最终配置
pub fn resolve(explicit: Option<&Path>, host: Option<&str>) -> Result<RoverConfig> {
    resolve_with_default(explicit, default_config_path().as_deref(), host)
}

fn resolve_with_default(
    explicit: Option<&Path>,
    fallback: Option<&Path>,
    host: Option<&str>,
) -> Result<RoverConfig> {
    let mut config = match (explicit, fallback) {
        (Some(path), _) => load(path)?,
        (None, Some(path)) if path.exists() => load(path)?,
        _ => RoverConfig::default(),
    };
    if let Some(host) = host {
        config.host = host.to_string();
    }
    Ok(config)
}

fn load(path: &Path) -> Result<RoverConfig> {
    RoverConfig::load_from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
