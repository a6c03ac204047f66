//! 驱动层错误类型定义

use rover_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 建立连接失败（超时或被拒绝）
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 套接字读写错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 当前未连接（或连接已进入 Error 状态）
    #[error("Not connected")]
    NotConnected,

    /// 接收线程启动失败
    #[error("IO thread error: {0}")]
    IoThread(String),
}

impl DriverError {
    /// 是否为连接阶段错误
    pub fn is_connect_error(&self) -> bool {
        matches!(self, DriverError::Connect { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::Connect {
            addr: "127.0.0.1:5000".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("127.0.0.1:5000") && msg.contains("refused"));
        assert!(err.is_connect_error());

        let err = DriverError::NotConnected;
        assert_eq!(format!("{}", err), "Not connected");

        let err = DriverError::IoThread("spawn failed".to_string());
        assert!(format!("{}", err).contains("spawn failed"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: DriverError = ProtocolError::Eof.into();
        assert!(matches!(err, DriverError::Protocol(ProtocolError::Eof)));
        assert!(!err.is_connect_error());
    }

    #[test]
    fn test_from_io_error() {
        let err: DriverError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, DriverError::Io(_)));
    }
}
