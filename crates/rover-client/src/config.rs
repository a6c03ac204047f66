//! TOML 配置
//!
//! 所有字段都有默认值，配置文件只需写出要覆盖的项：
//!
//! ```toml
//! host = "192.168.1.42"
//!
//! [collision]
//! cooldown_ms = 1500
//! stop_on_collision = false
//! ```

use crate::error::Result;
use rover_driver::{CollisionConfig, PipelineConfig};
use rover_protocol::{DEFAULT_COMMAND_PORT, DEFAULT_MAX_FRAME_LEN, DEFAULT_VIDEO_PORT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 默认控制器主机名
pub const DEFAULT_HOST: &str = "raspberrypi.local";

/// 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    /// 控制器主机名或 IP
    pub host: String,
    /// 指令端口
    pub command_port: u16,
    /// 视频端口
    pub video_port: u16,
    /// 连接超时（毫秒），只作用于建立连接阶段
    pub connect_timeout_ms: u64,
    pub video: VideoSettings,
    pub collision: CollisionSettings,
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            command_port: DEFAULT_COMMAND_PORT,
            video_port: DEFAULT_VIDEO_PORT,
            connect_timeout_ms: 5000,
            video: VideoSettings::default(),
            collision: CollisionSettings::default(),
        }
    }
}

impl RoverConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// 从文件加载
    ///
    /// # 错误
    /// - `ClientError::Io`: 文件不可读
    /// - `ClientError::Config`: TOML 格式或字段类型错误
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// 接收线程配置
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_frame_len: self.video.max_frame_len,
            ..Default::default()
        }
    }
}

/// 视频通道配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// 单帧最大字节数，超出视为流失步
    pub max_frame_len: usize,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// 碰撞检测配置（文件格式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub delta_threshold_cm: f64,
    pub proximity_threshold_cm: f64,
    pub cooldown_ms: u64,
    pub stuck_threshold_cm: f64,
    pub stuck_tolerance_cm: f64,
    /// 0 表示关闭卡住检测
    pub stuck_readings: u32,
    pub stop_on_collision: bool,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        CollisionConfig::default().into()
    }
}

impl From<CollisionConfig> for CollisionSettings {
    fn from(c: CollisionConfig) -> Self {
        Self {
            delta_threshold_cm: c.delta_threshold_cm,
            proximity_threshold_cm: c.proximity_threshold_cm,
            cooldown_ms: c.cooldown.as_millis() as u64,
            stuck_threshold_cm: c.stuck_threshold_cm,
            stuck_tolerance_cm: c.stuck_tolerance_cm,
            stuck_readings: c.stuck_readings,
            stop_on_collision: c.stop_on_collision,
        }
    }
}

impl From<&CollisionSettings> for CollisionConfig {
    fn from(s: &CollisionSettings) -> Self {
        Self {
            delta_threshold_cm: s.delta_threshold_cm,
            proximity_threshold_cm: s.proximity_threshold_cm,
            cooldown: Duration::from_millis(s.cooldown_ms),
            stuck_threshold_cm: s.stuck_threshold_cm,
            stuck_tolerance_cm: s.stuck_tolerance_cm,
            stuck_readings: s.stuck_readings,
            stop_on_collision: s.stop_on_collision,
        }
    }
}
