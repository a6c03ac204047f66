//! 共享状态结构定义
//!
//! 接收线程是唯一的写者，任意线程都可以读取：
//! - 传感器快照：ArcSwap 整体替换，读者永远看不到"半新半旧"的复合更新
//! - 最新帧：ArcSwapOption 整体替换，最新者胜出，无队列无背压

use crate::channel::CommandWriter;
use crate::connection::AtomicConnectionState;
use crate::error::DriverError;
use crate::hooks::HookManager;
use crate::metrics::RoverMetrics;
use arc_swap::{ArcSwap, ArcSwapOption};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use rover_protocol::{Command, Response};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{error, trace};

/// 传感器通道
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorChannel {
    /// 超声波测距
    Distance = 0b0001,
    /// 电池电压
    Battery = 0b0010,
    /// 光敏（左右）
    Light = 0b0100,
    /// 红外循迹（左中右）
    Line = 0b1000,
}

impl SensorChannel {
    /// 有效性掩码中的对应位
    pub fn mask(self) -> u8 {
        self as u8
    }

    /// 响应对应的传感器通道
    pub fn of(response: &Response) -> Option<Self> {
        match response {
            Response::Distance(_) => Some(Self::Distance),
            Response::Power(_) => Some(Self::Battery),
            Response::Light { .. } => Some(Self::Light),
            Response::Line { .. } => Some(Self::Line),
            Response::Unrecognized => None,
        }
    }
}

/// 传感器快照
///
/// 每个通道只保留最新读数，无历史。
///
/// **注意**：初始值为 0，与真实的 0 读数无法区分。
/// 需要区分时请检查 `valid_mask`（或 [`SensorSnapshot::has`]）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    /// 超声波距离（cm）
    pub distance_cm: f64,
    /// 电池电压（V）
    pub battery_v: f64,
    /// 左侧光敏
    pub light_left: f64,
    /// 右侧光敏
    pub light_right: f64,
    /// 左侧红外
    pub ir_left: f64,
    /// 中间红外
    pub ir_center: f64,
    /// 右侧红外
    pub ir_right: f64,

    /// 有效性掩码（见 [`SensorChannel`]）
    /// - 1 表示该通道至少收到过一次读数
    /// - 0 表示仍为初始值
    pub valid_mask: u8,
    /// 更新序号（每次成功更新 +1，从 0 开始）
    pub sequence: u64,
    /// 最近一次更新的系统时间
    pub updated_at: Option<Instant>,
}

impl SensorSnapshot {
    /// 该通道是否已收到过读数
    pub fn has(&self, channel: SensorChannel) -> bool {
        self.valid_mask & channel.mask() != 0
    }

    /// 将响应写入快照
    ///
    /// 返回是否发生了更新（`Unrecognized` 不更新）。
    pub fn apply(&mut self, response: &Response) -> bool {
        match *response {
            Response::Distance(d) => self.distance_cm = d,
            Response::Power(v) => self.battery_v = v,
            Response::Light { left, right } => {
                self.light_left = left;
                self.light_right = right;
            },
            Response::Line {
                left,
                center,
                right,
            } => {
                self.ir_left = left;
                self.ir_center = center;
                self.ir_right = right;
            },
            Response::Unrecognized => return false,
        }
        if let Some(channel) = SensorChannel::of(response) {
            self.valid_mask |= channel.mask();
        }
        true
    }
}

/// 传感器存储
///
/// 写入时持有独占锁完成"复制-修改-替换"，读取无锁。
#[derive(Debug)]
pub struct SensorStore {
    current: ArcSwap<SensorSnapshot>,
    write_lock: Mutex<()>,
}

impl Default for SensorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorStore {
    /// 创建空存储（所有读数为 0）
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(SensorSnapshot::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// 获取快照副本（无锁）
    pub fn snapshot(&self) -> SensorSnapshot {
        self.current.load().as_ref().clone()
    }

    /// 获取共享快照（无锁，零拷贝）
    pub fn load(&self) -> Arc<SensorSnapshot> {
        self.current.load_full()
    }

    /// 应用一条响应
    ///
    /// 返回更新后的完整快照；未识别的响应返回 `None`。
    pub fn apply(&self, response: &Response) -> Option<SensorSnapshot> {
        let _guard = self.write_lock.lock();
        let mut next = self.current.load().as_ref().clone();
        if !next.apply(response) {
            return None;
        }
        next.sequence += 1;
        next.updated_at = Some(Instant::now());
        self.current.store(Arc::new(next.clone()));
        Some(next)
    }

    /// 重置为初始值
    pub fn reset(&self) {
        let _guard = self.write_lock.lock();
        self.current.store(Arc::new(SensorSnapshot::default()));
    }
}

/// 视频帧（一张编码后的图像）
///
/// 数据不可变，克隆开销为一次引用计数递增。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: Bytes,
    /// 帧序号（从 1 开始）
    pub sequence: u64,
    /// 接收完成的系统时间
    pub received_at: Instant,
}

impl Frame {
    /// 创建新帧
    pub fn new(data: impl Into<Bytes>, sequence: u64) -> Self {
        Self {
            data: data.into(),
            sequence,
            received_at: Instant::now(),
        }
    }

    /// JPEG 数据
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 共享的底层缓冲区
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// 字节数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空帧
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 最新帧插槽（最新者胜出）
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: ArcSwapOption<Frame>,
    counter: AtomicU64,
}

impl FrameSlot {
    /// 创建空插槽
    pub fn new() -> Self {
        Self::default()
    }

    /// 发布新帧（原子替换）
    pub fn publish(&self, data: impl Into<Bytes>) -> Frame {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = Frame::new(data, sequence);
        self.latest.store(Some(Arc::new(frame.clone())));
        frame
    }

    /// 获取最新帧
    pub fn latest(&self) -> Option<Frame> {
        self.latest.load_full().map(|f| f.as_ref().clone())
    }

    /// 清空
    pub fn clear(&self) {
        self.latest.store(None);
    }
}

/// 共享状态上下文
///
/// 由门面、两个接收线程以及回调共同持有。
#[derive(Default)]
pub struct RoverContext {
    /// 传感器快照
    pub sensors: SensorStore,
    /// 最新视频帧
    pub frames: FrameSlot,
    /// 回调槽位
    pub hooks: RwLock<HookManager>,
    /// IO 指标
    pub metrics: RoverMetrics,
    /// 连接状态
    pub connection: AtomicConnectionState,
    /// 指令写端（连接期间存在）
    writer: ArcSwapOption<CommandWriter>,
}

impl RoverContext {
    /// 创建新的上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 安装指令写端
    pub fn attach_writer(&self, writer: CommandWriter) {
        self.writer.store(Some(Arc::new(writer)));
    }

    /// 移除指令写端
    pub fn detach_writer(&self) {
        self.writer.store(None);
    }

    /// 发送一条指令（发送即返回，不等待响应）
    ///
    /// 调用方线程与接收线程（碰撞急停）走同一把发送锁，
    /// 该锁从不与读取同时持有，因此不会死锁。
    ///
    /// # 错误
    /// - `DriverError::NotConnected`: 未连接，或此前写入失败后尚未重连
    /// - `DriverError::Io`: 写入失败（状态同时切换为 `Error`）
    pub fn send(&self, command: &Command) -> Result<(), DriverError> {
        if !self.connection.get().is_connected() {
            return Err(DriverError::NotConnected);
        }
        let writer = self.writer.load_full().ok_or(DriverError::NotConnected)?;

        let line = command.encode();
        match writer.write_line(&line) {
            Ok(()) => {
                self.metrics.commands_sent.fetch_add(1, Ordering::Relaxed);
                trace!("Sent command: {}", command);
                Ok(())
            },
            Err(e) => {
                self.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                error!("Failed to send command {}: {}", command, e);
                self.connection.mark_lost();
                Err(DriverError::Io(e))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use std::io::{self, Write};
    use std::thread;

    #[test]
    fn test_snapshot_apply() {
        let mut s = SensorSnapshot::default();
        assert!(!s.has(SensorChannel::Distance));

        assert!(s.apply(&Response::Distance(42.0)));
        assert_eq!(s.distance_cm, 42.0);
        assert!(s.has(SensorChannel::Distance));
        assert!(!s.has(SensorChannel::Battery));

        assert!(s.apply(&Response::Line {
            left: 1.0,
            center: 0.0,
            right: 1.0
        }));
        assert_eq!((s.ir_left, s.ir_center, s.ir_right), (1.0, 0.0, 1.0));

        assert!(!s.apply(&Response::Unrecognized));
    }

    #[test]
    fn test_store_sequence_and_reset() {
        let store = SensorStore::new();
        assert_eq!(store.snapshot().sequence, 0);

        let s = store.apply(&Response::Power(7.4)).unwrap();
        assert_eq!(s.sequence, 1);
        assert_eq!(s.battery_v, 7.4);
        assert!(s.updated_at.is_some());

        assert!(store.apply(&Response::Unrecognized).is_none());
        assert_eq!(store.snapshot().sequence, 1);

        store.reset();
        assert_eq!(store.snapshot(), SensorSnapshot::default());
    }

    /// 并发读取不会观察到同一次复合更新的"半新半旧"状态
    #[test]
    fn test_compound_update_is_atomic_for_readers() {
        let store = Arc::new(SensorStore::new());
        let writer_store = store.clone();
        let writer = thread::spawn(move || {
            for i in 0..5000 {
                let v = i as f64;
                writer_store.apply(&Response::Light { left: v, right: v });
            }
        });

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            readers.push(thread::spawn(move || {
                for _ in 0..5000 {
                    let s = store.load();
                    assert_eq!(s.light_left, s.light_right);
                }
            }));
        }

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.snapshot().light_left, 4999.0);
    }

    #[test]
    fn test_frame_slot_latest_wins() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());

        slot.publish(vec![1u8, 2, 3]);
        let second = slot.publish(vec![4u8, 5]);
        let latest = slot.latest().unwrap();
        assert_eq!(latest.data(), &[4, 5]);
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest, second);

        slot.clear();
        assert!(slot.latest().is_none());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_requires_connection() {
        let ctx = RoverContext::new();
        assert!(matches!(
            ctx.send(&Command::stop()),
            Err(DriverError::NotConnected)
        ));
    }

    #[test]
    fn test_send_failure_marks_error_and_stops_writes() {
        let ctx = RoverContext::new();
        ctx.attach_writer(CommandWriter::new(Box::new(BrokenPipe)));
        ctx.connection.set(ConnectionState::Connected);

        assert!(matches!(ctx.send(&Command::stop()), Err(DriverError::Io(_))));
        assert_eq!(ctx.connection.get(), ConnectionState::Error);
        assert!(matches!(
            ctx.send(&Command::stop()),
            Err(DriverError::NotConnected)
        ));
        assert_eq!(ctx.metrics.snapshot().send_failures, 1);
    }
}
