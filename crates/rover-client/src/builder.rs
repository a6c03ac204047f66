//! Client 层 Rover Builder

use crate::config::{CollisionSettings, RoverConfig};
use crate::error::Result;
use crate::rover::Rover;
use std::time::Duration;

/// Rover Builder
///
/// 链式设置连接参数，未设置的项使用 [`RoverConfig::default`]。
///
/// # 示例
///
/// ```rust,no_run
/// use rover_client::RoverBuilder;
/// use std::time::Duration;
///
/// # fn main() -> rover_client::Result<()> {
/// // 只构建，不连接
/// let rover = RoverBuilder::new().host("10.0.0.7").build();
///
/// // 构建并连接
/// let rover = RoverBuilder::new()
///     .host("10.0.0.7")
///     .connect_timeout(Duration::from_secs(2))
///     .stop_on_collision(false)
///     .connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoverBuilder {
    config: RoverConfig,
}

impl RoverBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有配置为起点
    pub fn from_config(config: RoverConfig) -> Self {
        Self { config }
    }

    /// 控制器主机名或 IP（默认: "raspberrypi.local"）
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// 指令端口（默认: 5000）
    pub fn command_port(mut self, port: u16) -> Self {
        self.config.command_port = port;
        self
    }

    /// 视频端口（默认: 8000）
    pub fn video_port(mut self, port: u16) -> Self {
        self.config.video_port = port;
        self
    }

    /// 连接超时（默认: 5 秒）
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 单帧最大字节数（默认: 8 MiB）
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.config.video.max_frame_len = len;
        self
    }

    /// 碰撞检测参数
    pub fn collision(mut self, collision: CollisionSettings) -> Self {
        self.config.collision = collision;
        self
    }

    /// 两次碰撞事件的最小间隔（默认: 2 秒）
    pub fn collision_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.collision.cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    /// 碰撞时是否自动急停（默认: true）
    pub fn stop_on_collision(mut self, enabled: bool) -> Self {
        self.config.collision.stop_on_collision = enabled;
        self
    }

    /// 构建未连接的客户端
    pub fn build(self) -> Rover {
        Rover::new(self.config)
    }

    /// 构建并连接
    pub fn connect(self) -> Result<Rover> {
        let mut rover = self.build();
        rover.connect()?;
        Ok(rover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let rover = RoverBuilder::new().build();
        assert_eq!(rover.config(), &RoverConfig::default());
    }

    #[test]
    fn test_builder_chain() {
        let rover = RoverBuilder::new()
            .host("10.0.0.7")
            .command_port(6000)
            .video_port(6001)
            .connect_timeout(Duration::from_millis(750))
            .max_frame_len(4096)
            .collision_cooldown(Duration::from_millis(500))
            .stop_on_collision(false)
            .build();

        let config = rover.config();
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.command_port, 6000);
        assert_eq!(config.video_port, 6001);
        assert_eq!(config.connect_timeout_ms, 750);
        assert_eq!(config.video.max_frame_len, 4096);
        assert_eq!(config.collision.cooldown_ms, 500);
        assert!(!config.collision.stop_on_collision);
    }
}
