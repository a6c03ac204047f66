//! `Rover` 门面
//!
//! 持有两条通道与共享上下文，对外提供同步 API。
//! 除 `connect`/`disconnect` 外，所有操作都只需要 `&self`，
//! 可以在多个线程间共享（发送由驱动层的发送锁串行化）。

use crate::config::RoverConfig;
use crate::error::{ClientError, Result};
use crate::types::{DriveDirection, LookDirection};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rover_driver::{
    CollisionConfig, CollisionEvent, CommandChannel, ConnectionState, Frame, MetricsSnapshot,
    RoverContext, SensorSnapshot, VideoChannel,
};
use rover_protocol::{Command, LedMode, Response, ServoChannel};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// 断开时等待接收线程退出的上限
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// `wait_for_update` 的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// 小车客户端
///
/// # 示例
///
/// ```rust,no_run
/// use rover_client::{DriveDirection, RoverBuilder};
/// use std::time::Duration;
///
/// # fn main() -> rover_client::Result<()> {
/// let mut rover = RoverBuilder::new().host("192.168.1.42").build();
/// rover.connect()?;
///
/// rover.on_collision(|event| println!("collision at {:.1} cm", event.distance_cm));
/// rover.drive_for(DriveDirection::Forward, 1500, Duration::from_secs(2))?;
///
/// rover.request_distance()?;
/// let seq = rover.sensors().sequence;
/// if let Some(s) = rover.wait_for_update(seq, Duration::from_millis(500)) {
///     println!("distance = {:.1} cm", s.distance_cm);
/// }
/// rover.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct Rover {
    config: RoverConfig,
    ctx: Arc<RoverContext>,
    command: Option<CommandChannel>,
    video: Option<VideoChannel>,
    is_running: Arc<AtomicBool>,
}

impl Rover {
    /// 创建未连接的客户端
    pub fn new(config: RoverConfig) -> Self {
        Self {
            config,
            ctx: Arc::new(RoverContext::new()),
            command: None,
            video: None,
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &RoverConfig {
        &self.config
    }

    /// 共享上下文（高级用法：直接读取快照或注册驱动层回调）
    pub fn context(&self) -> &Arc<RoverContext> {
        &self.ctx
    }

    // ==================== 连接生命周期 ====================

    /// 建立两条连接并启动接收线程
    ///
    /// 已连接时直接返回。两条通道都建立成功后才进入 `Connected`；
    /// 任一失败则关闭已打开的套接字，状态变为 `Error`。
    ///
    /// # 错误
    /// - `DriverError::Connect`: 任一端口连接失败或超时
    /// - `DriverError::IoThread`: 接收线程启动失败
    pub fn connect(&mut self) -> Result<()> {
        if self.ctx.connection.get().is_connected() {
            return Ok(());
        }
        // 清理上一次失败或断线留下的通道
        self.is_running.store(false, Ordering::Release);
        self.close_channels();
        self.ctx.connection.set(ConnectionState::Connecting);

        let host = self.config.host.clone();
        let timeout = self.config.connect_timeout();
        info!(
            "Connecting to {} (command {}, video {})",
            host, self.config.command_port, self.config.video_port
        );

        let command =
            match CommandChannel::connect(&host, self.config.command_port, timeout, self.ctx.clone())
            {
                Ok(channel) => channel,
                Err(e) => return Err(self.fail_connect(e.into())),
            };
        let video =
            match VideoChannel::connect(&host, self.config.video_port, timeout, self.ctx.clone()) {
                Ok(channel) => channel,
                Err(e) => {
                    command.shutdown(JOIN_TIMEOUT);
                    return Err(self.fail_connect(e.into()));
                },
            };
        self.command = Some(command);
        self.video = Some(video);

        // 每次连接使用新的运行标志，旧线程不会被复活
        self.is_running = Arc::new(AtomicBool::new(true));
        self.ctx.connection.set(ConnectionState::Connected);

        if let Err(e) = self.start_loops() {
            self.is_running.store(false, Ordering::Release);
            self.close_channels();
            return Err(self.fail_connect(e));
        }

        info!("Rover connected");
        Ok(())
    }

    fn start_loops(&mut self) -> Result<()> {
        let pipeline = self.config.pipeline();
        let collision = CollisionConfig::from(&self.config.collision);
        if let Some(command) = self.command.as_mut() {
            command.start(pipeline.clone(), collision, self.is_running.clone())?;
        }
        if let Some(video) = self.video.as_mut() {
            video.start(pipeline, self.is_running.clone())?;
        }
        Ok(())
    }

    fn fail_connect(&self, err: ClientError) -> ClientError {
        error!("Connection failed: {}", err);
        self.ctx.connection.set(ConnectionState::Error);
        err
    }

    fn close_channels(&mut self) {
        if let Some(command) = self.command.take() {
            command.shutdown(JOIN_TIMEOUT);
        }
        if let Some(video) = self.video.take() {
            video.shutdown(JOIN_TIMEOUT);
        }
    }

    /// 断开连接（幂等）
    ///
    /// 关闭套接字前先尽力发送一次停止指令，发送失败被忽略。
    pub fn disconnect(&mut self) {
        let had_channels = self.command.is_some() || self.video.is_some();

        if let Err(e) = self.ctx.send(&Command::stop()) {
            debug!("Stop before disconnect not sent: {}", e);
        }
        self.is_running.store(false, Ordering::Release);
        self.close_channels();
        self.ctx.connection.set(ConnectionState::Disconnected);

        if had_channels {
            info!("Rover disconnected");
        }
    }

    /// 当前连接状态
    pub fn state(&self) -> ConnectionState {
        self.ctx.connection.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// IO 指标
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 发送一条原始指令
    pub fn send(&self, command: &Command) -> Result<()> {
        Ok(self.ctx.send(command)?)
    }

    // ==================== 运动 ====================

    /// 四轮速度（各分量静默限幅到 ±4095）
    pub fn move_wheels(&self, fl: i32, bl: i32, fr: i32, br: i32) -> Result<()> {
        self.send(&Command::motor(fl, bl, fr, br))
    }

    /// 按方向行驶（不自动停止）
    pub fn drive(&self, direction: DriveDirection, speed: i32) -> Result<()> {
        let (fl, bl, fr, br) = direction.wheels(speed);
        self.move_wheels(fl, bl, fr, br)
    }

    /// 行驶一段时间后停止
    ///
    /// `duration` 为 0 时不自动停止。期间调用线程被阻塞。
    pub fn drive_for(&self, direction: DriveDirection, speed: i32, duration: Duration) -> Result<()> {
        self.drive(direction, speed)?;
        if !duration.is_zero() {
            spin_sleep::sleep(duration);
            self.stop()?;
        }
        Ok(())
    }

    pub fn forward(&self, speed: i32) -> Result<()> {
        self.drive(DriveDirection::Forward, speed)
    }

    pub fn backward(&self, speed: i32) -> Result<()> {
        self.drive(DriveDirection::Backward, speed)
    }

    /// 原地左转
    pub fn turn_left(&self, speed: i32) -> Result<()> {
        self.drive(DriveDirection::TurnLeft, speed)
    }

    /// 原地右转
    pub fn turn_right(&self, speed: i32) -> Result<()> {
        self.drive(DriveDirection::TurnRight, speed)
    }

    /// 左平移（仅麦克纳姆轮底盘有效）
    pub fn strafe_left(&self, speed: i32) -> Result<()> {
        self.drive(DriveDirection::StrafeLeft, speed)
    }

    /// 右平移（仅麦克纳姆轮底盘有效）
    pub fn strafe_right(&self, speed: i32) -> Result<()> {
        self.drive(DriveDirection::StrafeRight, speed)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(&Command::stop())
    }

    // ==================== 云台 ====================

    /// 设置云台角度（0-180，越界静默限幅）
    pub fn set_camera_angle(&self, horizontal: i32, vertical: i32) -> Result<()> {
        self.send(&Command::servo(ServoChannel::Pan, horizontal))?;
        self.send(&Command::servo(ServoChannel::Tilt, vertical))
    }

    /// 转到预设方向
    pub fn look(&self, direction: LookDirection) -> Result<()> {
        let (h, v) = direction.angles();
        self.set_camera_angle(h.into(), v.into())
    }

    // ==================== 灯光与声音 ====================

    /// 设置 LED 颜色（index 0 表示全部）
    pub fn set_led(&self, index: u8, r: u8, g: u8, b: u8) -> Result<()> {
        self.send(&Command::Led { index, r, g, b })
    }

    pub fn led_mode(&self, mode: LedMode) -> Result<()> {
        self.send(&Command::LedMode(mode))
    }

    pub fn led_off(&self) -> Result<()> {
        self.led_mode(LedMode::Off)
    }

    pub fn led_rainbow(&self) -> Result<()> {
        self.led_mode(LedMode::Rainbow)
    }

    pub fn buzzer(&self, on: bool) -> Result<()> {
        self.send(&Command::Buzzer(on))
    }

    /// 蜂鸣一次（开 → 等待 → 关），阻塞调用线程
    pub fn beep(&self, duration: Duration) -> Result<()> {
        self.buzzer(true)?;
        spin_sleep::sleep(duration);
        self.buzzer(false)
    }

    /// 在小车上播放音频文件
    pub fn play_audio(&self, clip: &str) -> Result<()> {
        self.send(&Command::Audio(clip.to_string()))
    }

    // ==================== 传感器 ====================

    /// 请求一次测距（读数异步到达）
    pub fn request_distance(&self) -> Result<()> {
        self.send(&Command::RequestDistance)
    }

    pub fn request_battery(&self) -> Result<()> {
        self.send(&Command::RequestPower)
    }

    pub fn request_light(&self) -> Result<()> {
        self.send(&Command::RequestLight)
    }

    pub fn request_line(&self) -> Result<()> {
        self.send(&Command::RequestLine)
    }

    /// 请求所有传感器
    pub fn request_all(&self) -> Result<()> {
        self.request_distance()?;
        self.request_battery()?;
        self.request_light()?;
        self.request_line()
    }

    /// 当前传感器快照
    ///
    /// 未收到过读数的通道为 0，需要区分时检查 `valid_mask`。
    pub fn sensors(&self) -> SensorSnapshot {
        self.ctx.sensors.snapshot()
    }

    /// 等待序号大于 `after_sequence` 的快照
    ///
    /// 只保证"有更新的读数"，不保证是哪一个请求的应答。
    /// 超时返回 `None`。
    pub fn wait_for_update(&self, after_sequence: u64, timeout: Duration) -> Option<SensorSnapshot> {
        let deadline = Instant::now() + timeout;
        loop {
            let snapshot = self.ctx.sensors.load();
            if snapshot.sequence > after_sequence {
                return Some((*snapshot).clone());
            }
            if Instant::now() >= deadline {
                return None;
            }
            spin_sleep::sleep(POLL_INTERVAL);
        }
    }

    // ==================== 视频 ====================

    /// 最新视频帧
    pub fn latest_frame(&self) -> Option<Frame> {
        self.ctx.frames.latest()
    }

    /// 把最新帧写入文件，返回写入的字节数
    ///
    /// # 错误
    /// - `ClientError::NoFrame`: 尚未收到任何帧
    /// - `ClientError::Io`: 写文件失败
    pub fn save_frame(&self, path: impl AsRef<Path>) -> Result<usize> {
        let frame = self.latest_frame().ok_or(ClientError::NoFrame)?;
        std::fs::write(path.as_ref(), frame.data())?;
        debug!(
            "Saved frame #{} ({} bytes) to {}",
            frame.sequence,
            frame.len(),
            path.as_ref().display()
        );
        Ok(frame.len())
    }

    /// 最新帧的 Base64 编码
    pub fn frame_base64(&self) -> Option<String> {
        self.latest_frame().map(|f| STANDARD.encode(f.data()))
    }

    // ==================== 回调 ====================
    //
    // 每类回调只有一个槽位，重新注册会替换旧回调。
    // 回调在接收线程中执行，应尽快返回。

    pub fn on_frame<F>(&self, callback: F)
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.ctx.hooks.write().set_frame_callback(Arc::new(callback));
    }

    /// 碰撞回调（急停指令已在回调之前发出）
    pub fn on_collision<F>(&self, callback: F)
    where
        F: Fn(&CollisionEvent) + Send + Sync + 'static,
    {
        self.ctx.hooks.write().set_collision_callback(Arc::new(callback));
    }

    pub fn on_sensor_update<F>(&self, callback: F)
    where
        F: Fn(&SensorSnapshot) + Send + Sync + 'static,
    {
        self.ctx.hooks.write().set_sensor_callback(Arc::new(callback));
    }

    /// 通用响应回调（每条成功解码的行，包括未识别标签）
    pub fn on_response<F>(&self, callback: F)
    where
        F: Fn(&str, &Response) + Send + Sync + 'static,
    {
        self.ctx.hooks.write().set_response_callback(Arc::new(callback));
    }

    /// 移除所有回调
    pub fn clear_callbacks(&self) {
        self.ctx.hooks.write().clear();
    }
}

impl Drop for Rover {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::wired_rover;

    #[test]
    fn test_motion_is_clamped() {
        let (rover, capture) = wired_rover();
        rover.move_wheels(5000, -5000, 0, 4095).unwrap();
        rover.forward(2000).unwrap();
        rover.turn_left(9999).unwrap();
        rover.stop().unwrap();

        assert_eq!(
            capture.lines(),
            vec![
                "CMD_MOTOR#4095#-4095#0#4095",
                "CMD_MOTOR#2000#2000#2000#2000",
                "CMD_MOTOR#-4095#-4095#4095#4095",
                "CMD_MOTOR#0#0#0#0",
            ]
        );
    }

    #[test]
    fn test_camera_led_and_sound() {
        let (rover, capture) = wired_rover();
        rover.look(LookDirection::Left).unwrap();
        rover.set_camera_angle(200, -10).unwrap();
        rover.set_led(0, 255, 0, 0).unwrap();
        rover.led_rainbow().unwrap();
        rover.beep(Duration::from_millis(1)).unwrap();
        rover.play_audio("whoa.wav").unwrap();

        assert_eq!(
            capture.lines(),
            vec![
                "CMD_SERVO#0#135",
                "CMD_SERVO#1#90",
                "CMD_SERVO#0#180",
                "CMD_SERVO#1#0",
                "CMD_LED#0#255#0#0",
                "CMD_LED_MOD#5",
                "CMD_BUZZER#1",
                "CMD_BUZZER#0",
                "CMD_AUDIO#whoa.wav",
            ]
        );
    }

    #[test]
    fn test_request_all_order() {
        let (rover, capture) = wired_rover();
        rover.request_all().unwrap();
        assert_eq!(
            capture.lines(),
            vec!["CMD_SONIC", "CMD_POWER", "CMD_LIGHT", "CMD_LINE"]
        );
    }

    #[test]
    fn test_drive_for_stops_afterwards() {
        let (rover, capture) = wired_rover();
        rover
            .drive_for(DriveDirection::Backward, 1000, Duration::from_millis(5))
            .unwrap();
        rover
            .drive_for(DriveDirection::Forward, 1000, Duration::ZERO)
            .unwrap();
        assert_eq!(
            capture.lines(),
            vec![
                "CMD_MOTOR#-1000#-1000#-1000#-1000",
                "CMD_MOTOR#0#0#0#0",
                "CMD_MOTOR#1000#1000#1000#1000",
            ]
        );
    }

    #[test]
    fn test_commands_fail_when_not_connected() {
        let rover = Rover::new(RoverConfig::default());
        assert_eq!(rover.state(), ConnectionState::Disconnected);
        assert!(rover.forward(1000).unwrap_err().is_not_connected());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (mut rover, capture) = wired_rover();
        rover.disconnect();
        rover.disconnect();
        assert_eq!(rover.state(), ConnectionState::Disconnected);
        // 只有第一次断开时发出停止指令
        assert_eq!(capture.lines(), vec!["CMD_MOTOR#0#0#0#0"]);
    }

    #[test]
    fn test_wait_for_update() {
        let (rover, _capture) = wired_rover();
        assert!(rover.wait_for_update(0, Duration::from_millis(10)).is_none());

        rover.ctx.sensors.apply(&Response::Distance(33.0));
        let s = rover.wait_for_update(0, Duration::from_millis(10)).unwrap();
        assert_eq!(s.distance_cm, 33.0);
        assert_eq!(s.sequence, 1);
    }

    #[test]
    fn test_frame_access() {
        let (rover, _capture) = wired_rover();
        assert!(rover.frame_base64().is_none());
        assert!(matches!(
            rover.save_frame("/tmp/unused.jpg"),
            Err(ClientError::NoFrame)
        ));

        rover.ctx.frames.publish(vec![0xFFu8, 0xD8, 0xFF]);
        assert_eq!(rover.frame_base64().as_deref(), Some("/9j/"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        assert_eq!(rover.save_frame(&path).unwrap(), 3);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }
}
