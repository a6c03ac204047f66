//! IO 链路指标
//!
//! 原子计数器，接收线程与发送方写入，任意线程读取，无锁。

use std::sync::atomic::{AtomicU64, Ordering};

/// 漫游车 IO 指标
///
/// # 使用示例
///
/// ```rust
/// use rover_driver::RoverMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = RoverMetrics::default();
/// metrics.lines_received.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.lines_received, 1);
/// ```
#[derive(Debug, Default)]
pub struct RoverMetrics {
    /// 指令通道收到的完整行数
    pub lines_received: AtomicU64,
    /// 无法解析的行数（字段不足、数值非法）
    pub lines_malformed: AtomicU64,
    /// 标签或子类型未识别的行数
    pub lines_unrecognized: AtomicU64,
    /// 视频通道收到的字节数（含长度头）
    pub bytes_received: AtomicU64,
    /// 视频通道收到的完整帧数
    pub frames_received: AtomicU64,
    /// 因超出长度上限被拒绝的帧数
    pub frames_dropped: AtomicU64,
    /// 成功发送的指令数
    pub commands_sent: AtomicU64,
    /// 发送失败次数
    pub send_failures: AtomicU64,
    /// 检测到的碰撞事件数
    pub collisions: AtomicU64,
}

impl RoverMetrics {
    /// 创建新的指标实例（所有计数器为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取所有计数器
    ///
    /// 各计数器分别读取，彼此之间可能存在微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_received: self.lines_received.load(Ordering::Relaxed),
            lines_malformed: self.lines_malformed.load(Ordering::Relaxed),
            lines_unrecognized: self.lines_unrecognized.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.lines_received,
            &self.lines_malformed,
            &self.lines_unrecognized,
            &self.bytes_received,
            &self.frames_received,
            &self.frames_dropped,
            &self.commands_sent,
            &self.send_failures,
            &self.collisions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_received: u64,
    pub lines_malformed: u64,
    pub lines_unrecognized: u64,
    pub bytes_received: u64,
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub commands_sent: u64,
    pub send_failures: u64,
    pub collisions: u64,
}

impl MetricsSnapshot {
    /// 可解析行所占比例（百分比）
    ///
    /// `lines_received` 为 0 时返回 100.0。
    pub fn line_health(&self) -> f64 {
        if self.lines_received == 0 {
            return 100.0;
        }
        let good = self.lines_received.saturating_sub(self.lines_malformed);
        (good as f64 / self.lines_received as f64) * 100.0
    }
}
