//! 连接状态定义
//!
//! 连接状态是通道向上层报告致命错误的唯一途径：
//! 接收线程或发送路径遇到 IO 错误时，将状态从 `Connected` 切换为 `Error`。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// 连接状态
///
/// # 状态转换
///
/// ```text
/// Disconnected ──connect()──▶ Connecting ──▶ Connected
///                                  │              │
///                                  ▼              ▼ (IO 错误)
///                                Error ◀──────────┘
/// ```
///
/// `disconnect()` 可从任意状态回到 `Disconnected`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    /// 未连接（默认）
    #[default]
    Disconnected = 0,
    /// 正在建立连接
    Connecting = 1,
    /// 两个通道均已建立
    Connected = 2,
    /// 连接失败或运行中出现 IO 错误
    Error = 3,
}

impl ConnectionState {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Error。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Error,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 是否已连接
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// 状态名称（小写）
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 连接状态（原子版本，用于线程间共享）
///
/// 任意时刻只有一个权威状态值。
#[derive(Debug, Default)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    /// 创建新的原子状态
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    /// 获取当前状态
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// 设置状态
    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state.as_u8(), Ordering::Release);
    }

    /// 比较并交换（Compare-and-Swap）
    ///
    /// 如果当前值等于 `current`，则设置为 `new` 并返回 true。
    pub fn transition(&self, current: ConnectionState, new: ConnectionState) -> bool {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 标记连接丢失（仅当当前为 `Connected` 时生效）
    ///
    /// 返回是否发生了状态切换。
    pub fn mark_lost(&self) -> bool {
        self.transition(ConnectionState::Connected, ConnectionState::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_conversions() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Error,
        ] {
            assert_eq!(ConnectionState::from_u8(state.as_u8()), state);
        }
        assert_eq!(ConnectionState::from_u8(200), ConnectionState::Error); // 无效值
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Error.is_connected());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::default().to_string(), "disconnected");
    }

    #[test]
    fn test_atomic_connection_state() {
        let state = AtomicConnectionState::default();
        assert_eq!(state.get(), ConnectionState::Disconnected);

        // 未连接时 mark_lost 无效
        assert!(!state.mark_lost());
        assert_eq!(state.get(), ConnectionState::Disconnected);

        state.set(ConnectionState::Connected);
        assert!(state.mark_lost());
        assert_eq!(state.get(), ConnectionState::Error);

        // 第二次不会重复切换
        assert!(!state.mark_lost());
    }

    #[test]
    fn test_transition() {
        let state = AtomicConnectionState::new(ConnectionState::Connecting);
        assert!(state.transition(ConnectionState::Connecting, ConnectionState::Connected));
        assert!(!state.transition(ConnectionState::Connecting, ConnectionState::Error));
        assert_eq!(state.get(), ConnectionState::Connected);
    }
}
