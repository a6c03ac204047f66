//! 驱动层模块
//!
//! 本模块提供小车控制器的连接与 IO 功能，包括：
//! - 指令通道（文本行协议，带发送锁）
//! - 视频通道（长度前缀 JPEG 帧）
//! - 接收线程（每个通道一个，阻塞读取）
//! - 状态同步（ArcSwap 无锁读取传感器快照与最新帧）
//! - 碰撞检测状态机（突降、接近、卡住）
//! - 回调槽位（单订阅者，后注册者覆盖）
//!
//! # 使用场景
//!
//! 适用于需要直接控制通道生命周期的场景。
//! 大多数用户应该使用 `rover-client` 提供的 `Rover` 门面。

mod channel;
pub mod collision;
pub mod connection;
mod error;
pub mod hooks;
pub mod metrics;
pub mod pipeline;
pub mod state;

pub use channel::{CommandChannel, CommandWriter, VideoChannel, connect_with_timeout};
pub use collision::{CollisionConfig, CollisionDetector, CollisionEvent, CollisionKind, CollisionState};
pub use connection::{AtomicConnectionState, ConnectionState};
pub use error::DriverError;
pub use hooks::{CollisionCallback, FrameCallback, HookManager, ResponseCallback, SensorCallback};
pub use metrics::{MetricsSnapshot, RoverMetrics};
pub use pipeline::{LineBuffer, PipelineConfig, ResponseDispatcher, command_rx_loop, video_rx_loop};
pub use state::*;
