//! 客户端错误类型

use rover_driver::DriverError;
use thiserror::Error;

/// 客户端错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 驱动层错误（连接、发送、线程）
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// 本地文件读写错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析错误
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON 解析错误（语音回复）
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// 尚未收到任何视频帧
    #[error("No video frame received yet")]
    NoFrame,

    /// 无法执行的指令（未知方向、模式等）
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl ClientError {
    /// 是否为"未连接"错误
    pub fn is_not_connected(&self) -> bool {
        matches!(self, ClientError::Driver(DriverError::NotConnected))
    }

    /// 是否为连接阶段错误
    pub fn is_connect_error(&self) -> bool {
        matches!(self, ClientError::Driver(e) if e.is_connect_error())
    }
}

/// 客户端结果类型别名
pub type Result<T> = std::result::Result<T, ClientError>;
