//! # Rover Protocol
//!
//! 小车控制器的通信协议定义（无 IO 线程、无套接字依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（端口、分隔符、限幅）
//! - `command`: 出站指令编码（`CMD_MOTOR#...` 等）
//! - `response`: 入站响应行解析（遥测数据）
//! - `video`: 视频流帧头解析与精确读取
//!
//! ## 线路格式
//!
//! 指令通道为 ASCII 文本行，字段以 `#` 分隔，以 `\n` 结尾：
//!
//! ```text
//! CMD_MOTOR#2000#2000#2000#2000\n
//! CMD_MODE#3#42.5\n
//! ```
//!
//! 视频通道为二进制流，每帧前缀 4 字节小端长度：
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ JPEG payload (Length)    │
//! │ Little-endian u32│                          │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! **注意**：协议不对分隔符做转义，参数（例如音频文件名）中不能包含 `#`。
//! 本层不做防御性检查，由调用方保证。

pub mod command;
pub mod constants;
pub mod response;
pub mod video;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use response::*;
pub use video::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 行被分割后字段数不足（噪声或不完整行）
    #[error("Too few fields: expected at least {expected}, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    /// 数值字段解析失败
    #[error("Invalid number for field {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// 字段取值超出协议范围
    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: i64 },

    /// 未知的指令名称
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// 视频帧声明的长度超过上限
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    /// 读取到一半时流被关闭
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// 在帧边界处流被关闭
    #[error("End of stream")]
    Eof,

    /// 底层 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// 是否为流终止类错误（读循环应当退出）
    ///
    /// 行级解析错误（字段不足、数值错误、未知指令）只影响当前行，
    /// 而流错误意味着连接已经不可用。
    pub fn is_stream_error(&self) -> bool {
        matches!(
            self,
            Self::Eof | Self::ShortRead { .. } | Self::Io(_) | Self::FrameTooLarge { .. }
        )
    }
}

/// 解析浮点字段（内部工具函数）
pub(crate) fn parse_f64(field: &'static str, value: &str) -> Result<f64, ProtocolError> {
    value.trim().parse::<f64>().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// 解析整数字段（内部工具函数）
pub(crate) fn parse_i64(field: &'static str, value: &str) -> Result<i64, ProtocolError> {
    value.trim().parse::<i64>().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
