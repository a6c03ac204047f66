//! Pipeline IO 循环模块
//!
//! 两个接收循环，各自运行在独立线程中：
//! - 指令通道：按 `\n` 重组响应行 → 解码 → 碰撞检测 → 传感器存储 → 回调
//! - 视频通道：读取长度前缀帧 → 替换最新帧 → 回调
//!
//! 稳态读取不设超时，关闭套接字是唯一能打断阻塞读的方式。
//! 任何读错误都会结束循环，循环内不重试。

use crate::collision::{CollisionConfig, CollisionDetector};
use crate::state::RoverContext;
use rover_protocol::{Command, DEFAULT_MAX_FRAME_LEN, FrameReader, ProtocolError, Response};
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Pipeline 配置
///
/// # Example
///
/// ```
/// use rover_driver::PipelineConfig;
///
/// let config = PipelineConfig {
///     max_frame_len: 2 * 1024 * 1024,
///     ..Default::default()
/// };
/// assert_eq!(config.read_buffer_size, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 指令通道单次读取的缓冲区大小
    pub read_buffer_size: usize,
    /// 单行最大长度，超出后丢弃已缓存的数据
    pub max_line_len: usize,
    /// 视频帧最大长度
    pub max_frame_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 1024,
            max_line_len: 64 * 1024,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// 行缓冲区
///
/// 收集任意切分的字节块，按 `\n` 切出完整行。
/// 不完整的尾部保留到下一次 `extend`。
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_line_len: usize,
}

impl LineBuffer {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_len,
        }
    }

    /// 追加字节并返回其中所有完整的行
    ///
    /// 返回的行已去除首尾空白（包括 `\r`），空行被跳过。
    /// 非 UTF-8 字节按替换字符处理。
    pub fn extend(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let line = String::from_utf8_lossy(&self.buf[start..end]);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_owned());
            }
            start = end + 1;
        }
        self.buf.drain(..start);

        if self.max_line_len > 0 && self.buf.len() > self.max_line_len {
            warn!(
                "Discarding {} buffered bytes without line terminator",
                self.buf.len()
            );
            self.buf.clear();
        }
        lines
    }

    /// 尚未组成完整行的字节数
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// 响应分发器
///
/// 处理单条响应行；由指令接收线程独占。
pub struct ResponseDispatcher {
    ctx: Arc<RoverContext>,
    detector: CollisionDetector,
    stop_on_collision: bool,
}

impl ResponseDispatcher {
    pub fn new(ctx: Arc<RoverContext>, collision: CollisionConfig) -> Self {
        let stop_on_collision = collision.stop_on_collision;
        Self {
            ctx,
            detector: CollisionDetector::new(collision),
            stop_on_collision,
        }
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    /// 处理一条完整的响应行
    ///
    /// 距离读数先交给碰撞检测（可能触发急停），再写入传感器存储。
    /// 解码失败的行只计数，不会中断接收循环。
    pub fn handle_line(&mut self, line: &str) {
        let ctx = &self.ctx;
        ctx.metrics.lines_received.fetch_add(1, Ordering::Relaxed);

        let response = match rover_protocol::decode_response(line) {
            Ok(response) => response,
            Err(e) => {
                ctx.metrics.lines_malformed.fetch_add(1, Ordering::Relaxed);
                trace!("Ignoring malformed line {:?}: {}", line, e);
                return;
            },
        };

        // 先把回调克隆出来，回调内部可以重新注册而不会死锁
        let hooks = ctx.hooks.read().clone();
        hooks.fire_response(line, &response);

        if response.is_unrecognized() {
            ctx.metrics.lines_unrecognized.fetch_add(1, Ordering::Relaxed);
            trace!("Unrecognized response: {:?}", line);
            return;
        }

        if let Response::Distance(distance) = response
            && let Some(event) = self.detector.observe(distance, Instant::now())
        {
            ctx.metrics.collisions.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Collision detected ({}): {:.1} cm -> {:.1} cm",
                event.kind, event.previous_cm, event.distance_cm
            );
            if self.stop_on_collision
                && let Err(e) = ctx.send(&Command::stop())
            {
                error!("Failed to send emergency stop: {}", e);
            }
            hooks.fire_collision(&event);
        }

        if let Some(snapshot) = ctx.sensors.apply(&response) {
            hooks.fire_sensor(&snapshot);
        }
    }
}

/// 指令通道接收循环
///
/// 阻塞读取直到 EOF 或读错误。若退出时 `is_running` 仍为 true，
/// 说明连接被意外断开，连接状态会被标记为 `Error`。
pub fn command_rx_loop<R: Read>(
    mut reader: R,
    mut dispatcher: ResponseDispatcher,
    config: PipelineConfig,
    is_running: Arc<AtomicBool>,
) {
    let ctx = dispatcher.ctx.clone();
    let mut lines = LineBuffer::new(config.max_line_len);
    let mut buf = vec![0u8; config.read_buffer_size.max(1)];

    loop {
        // Acquire: If we see false, we must see all cleanup writes from other threads
        if !is_running.load(Ordering::Acquire) {
            trace!("Command RX thread: is_running flag is false, exiting");
            break;
        }

        let n = match reader.read(&mut buf) {
            Ok(0) => {
                info!("Command channel closed by peer");
                break;
            },
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                if is_running.load(Ordering::Acquire) {
                    error!("Command channel read error: {}", e);
                } else {
                    debug!("Command channel read aborted during shutdown: {}", e);
                }
                break;
            },
        };

        for line in lines.extend(&buf[..n]) {
            dispatcher.handle_line(&line);
        }
    }

    if is_running.load(Ordering::Acquire) {
        ctx.connection.mark_lost();
    }
    trace!("Command RX thread exited");
}

/// 视频通道接收循环
///
/// 每收到一帧就原子替换最新帧插槽并触发帧回调。
/// 读到残缺帧或超长帧时终止。
pub fn video_rx_loop<R: Read>(
    reader: R,
    ctx: Arc<RoverContext>,
    config: PipelineConfig,
    is_running: Arc<AtomicBool>,
) {
    let mut frames = FrameReader::with_max_frame_len(reader, config.max_frame_len);

    loop {
        if !is_running.load(Ordering::Acquire) {
            trace!("Video RX thread: is_running flag is false, exiting");
            break;
        }

        match frames.read_frame() {
            Ok(data) => {
                ctx.metrics
                    .bytes_received
                    .fetch_add((data.len() + 4) as u64, Ordering::Relaxed);
                ctx.metrics.frames_received.fetch_add(1, Ordering::Relaxed);

                let frame = ctx.frames.publish(data);
                trace!("Video frame #{} ({} bytes)", frame.sequence, frame.len());

                let hooks = ctx.hooks.read().clone();
                hooks.fire_frame(&frame);
            },
            Err(ProtocolError::Eof) => {
                info!("Video channel closed by peer");
                break;
            },
            Err(e @ ProtocolError::ShortRead { .. }) => {
                warn!("Video stream ended mid-frame: {}", e);
                break;
            },
            Err(e @ ProtocolError::FrameTooLarge { .. }) => {
                ctx.metrics.frames_dropped.fetch_add(1, Ordering::Relaxed);
                error!("Video stream desynchronized: {}", e);
                break;
            },
            Err(e) => {
                if is_running.load(Ordering::Acquire) {
                    error!("Video channel read error: {}", e);
                } else {
                    debug!("Video channel read aborted during shutdown: {}", e);
                }
                break;
            },
        }
    }

    if is_running.load(Ordering::Acquire) {
        ctx.connection.mark_lost();
    }
    trace!("Video RX thread exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::CommandWriter;
    use crate::collision::{CollisionEvent, CollisionKind};
    use crate::connection::ConnectionState;
    use crate::state::{Frame, SensorSnapshot};
    use parking_lot::Mutex;
    use rover_protocol::encode_frame_len;
    use std::io::{self, Write};

    /// 记录写入内容的共享缓冲区
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn connected_ctx() -> (Arc<RoverContext>, SharedSink) {
        let ctx = Arc::new(RoverContext::new());
        let sink = SharedSink::default();
        ctx.attach_writer(CommandWriter::new(Box::new(sink.clone())));
        ctx.connection.set(ConnectionState::Connected);
        (ctx, sink)
    }

    #[test]
    fn test_line_buffer_reassembles_split_lines() {
        let mut buf = LineBuffer::new(1024);
        assert!(buf.extend(b"CMD_MO").is_empty());
        assert!(buf.extend(b"DE#3#4").is_empty());
        let lines = buf.extend(b"2.5\nCMD_POWER#7.9\r\nCMD_");
        assert_eq!(lines, vec!["CMD_MODE#3#42.5", "CMD_POWER#7.9"]);
        assert_eq!(buf.pending(), 4);
    }

    #[test]
    fn test_line_buffer_skips_empty_lines() {
        let mut buf = LineBuffer::new(1024);
        assert_eq!(buf.extend(b"\n\n  \nA#1\n"), vec!["A#1"]);
    }

    #[test]
    fn test_line_buffer_overflow_discards() {
        let mut buf = LineBuffer::new(8);
        assert!(buf.extend(b"0123456789").is_empty());
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.extend(b"A#1\n"), vec!["A#1"]);
    }

    #[test]
    fn test_dispatch_updates_sensors_and_fires_callbacks() {
        let (ctx, _sink) = connected_ctx();
        let seen = Arc::new(Mutex::new(Vec::<SensorSnapshot>::new()));
        let raw = Arc::new(Mutex::new(Vec::<String>::new()));
        {
            let mut hooks = ctx.hooks.write();
            let seen = seen.clone();
            hooks.set_sensor_callback(Arc::new(move |s: &SensorSnapshot| {
                seen.lock().push(s.clone());
            }));
            let raw = raw.clone();
            hooks.set_response_callback(Arc::new(move |line: &str, _: &Response| {
                raw.lock().push(line.to_owned());
            }));
        }

        let mut dispatcher = ResponseDispatcher::new(ctx.clone(), CollisionConfig::default());
        dispatcher.handle_line("CMD_MODE#2#512#300");
        dispatcher.handle_line("CMD_POWER#7.6");
        dispatcher.handle_line("CMD_UNKNOWN#1");
        dispatcher.handle_line("CMD_MODE#3#abc");

        let s = ctx.sensors.snapshot();
        assert_eq!((s.light_left, s.light_right), (512.0, 300.0));
        assert_eq!(s.battery_v, 7.6);
        assert_eq!(s.sequence, 2);

        assert_eq!(seen.lock().len(), 2);
        assert_eq!(raw.lock().len(), 3);

        let m = ctx.metrics.snapshot();
        assert_eq!(m.lines_received, 4);
        assert_eq!(m.lines_malformed, 1);
        assert_eq!(m.lines_unrecognized, 1);
    }

    #[test]
    fn test_collision_sends_stop_before_sensor_update() {
        let (ctx, sink) = connected_ctx();
        let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        {
            let mut hooks = ctx.hooks.write();
            let o = order.clone();
            hooks.set_collision_callback(Arc::new(move |e: &CollisionEvent| {
                assert_eq!(e.kind, CollisionKind::Proximity);
                o.lock().push("collision");
            }));
            let o = order.clone();
            hooks.set_sensor_callback(Arc::new(move |_: &SensorSnapshot| {
                o.lock().push("sensor");
            }));
        }

        let mut dispatcher = ResponseDispatcher::new(ctx.clone(), CollisionConfig::default());
        for d in ["50", "48", "10", "9", "8"] {
            dispatcher.handle_line(&format!("CMD_MODE#3#{}", d));
        }

        let written = String::from_utf8(sink.0.lock().clone()).unwrap();
        assert_eq!(written, "CMD_MOTOR#0#0#0#0\n");
        assert_eq!(ctx.metrics.snapshot().collisions, 1);
        assert_eq!(ctx.sensors.snapshot().distance_cm, 8.0);

        let order = order.lock();
        assert_eq!(order.len(), 6);
        assert_eq!(order[2], "collision");
        assert_eq!(order[3], "sensor");
    }

    #[test]
    fn test_collision_without_auto_stop() {
        let (ctx, sink) = connected_ctx();
        let config = CollisionConfig {
            stop_on_collision: false,
            ..Default::default()
        };
        let mut dispatcher = ResponseDispatcher::new(ctx.clone(), config);
        dispatcher.handle_line("CMD_MODE#3#100");
        dispatcher.handle_line("CMD_MODE#3#60");

        assert!(sink.0.lock().is_empty());
        assert_eq!(ctx.metrics.snapshot().collisions, 1);
    }

    #[test]
    fn test_command_rx_loop_marks_lost_on_eof() {
        let (ctx, _sink) = connected_ctx();
        let input: &[u8] = b"CMD_MODE#3#42\nCMD_POWER#8.1\n";
        let dispatcher = ResponseDispatcher::new(ctx.clone(), CollisionConfig::default());

        command_rx_loop(
            input,
            dispatcher,
            PipelineConfig::default(),
            Arc::new(AtomicBool::new(true)),
        );

        let s = ctx.sensors.snapshot();
        assert_eq!(s.distance_cm, 42.0);
        assert_eq!(s.battery_v, 8.1);
        assert_eq!(ctx.connection.get(), ConnectionState::Error);
    }

    #[test]
    fn test_command_rx_loop_keeps_state_when_stopping() {
        let (ctx, _sink) = connected_ctx();
        let dispatcher = ResponseDispatcher::new(ctx.clone(), CollisionConfig::default());

        command_rx_loop(
            &b""[..],
            dispatcher,
            PipelineConfig::default(),
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(ctx.connection.get(), ConnectionState::Connected);
    }

    #[test]
    fn test_video_rx_loop_publishes_frames() {
        let (ctx, _sink) = connected_ctx();
        let frames = Arc::new(Mutex::new(Vec::<u64>::new()));
        {
            let f = frames.clone();
            ctx.hooks
                .write()
                .set_frame_callback(Arc::new(move |frame: &Frame| f.lock().push(frame.sequence)));
        }

        let mut stream = Vec::new();
        for payload in [&b"\xFF\xD8first"[..], &b"\xFF\xD8second"[..]] {
            stream.extend_from_slice(&encode_frame_len(payload.len() as u32));
            stream.extend_from_slice(payload);
        }
        // 残缺的第三帧
        stream.extend_from_slice(&encode_frame_len(100));
        stream.extend_from_slice(b"partial");

        video_rx_loop(
            stream.as_slice(),
            ctx.clone(),
            PipelineConfig::default(),
            Arc::new(AtomicBool::new(true)),
        );

        assert_eq!(*frames.lock(), vec![1, 2]);
        let latest = ctx.frames.latest().unwrap();
        assert_eq!(latest.data(), b"\xFF\xD8second");
        assert_eq!(ctx.metrics.snapshot().frames_received, 2);
        assert_eq!(ctx.connection.get(), ConnectionState::Error);
    }

    #[test]
    fn test_video_rx_loop_rejects_oversized_frame() {
        let (ctx, _sink) = connected_ctx();
        let mut stream = encode_frame_len(1024).to_vec();
        stream.extend_from_slice(&[0u8; 1024]);

        let config = PipelineConfig {
            max_frame_len: 512,
            ..Default::default()
        };
        video_rx_loop(stream.as_slice(), ctx.clone(), config, Arc::new(AtomicBool::new(true)));

        assert!(ctx.frames.latest().is_none());
        assert_eq!(ctx.metrics.snapshot().frames_dropped, 1);
    }
}
