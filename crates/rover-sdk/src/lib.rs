//! Rover SDK - 轮式小车远程控制 Rust SDK
//!
//! 通过两条 TCP 连接控制小车：
//! - 指令通道（默认 5000 端口）：`NAME#arg#arg\n` 文本行协议，双向
//! - 视频通道（默认 8000 端口）：`[u32 小端长度][JPEG]` 帧流，单向
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 指令编码、响应解码、视频帧解析
//! - **驱动层** (`driver`): 套接字、接收线程、传感器快照、碰撞检测
//! - **客户端层** (`client`): `Rover` 门面、配置、语音指令、碰撞音效
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use rover_sdk::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> rover_sdk::Result<()> {
//! rover_sdk::init_logger();
//!
//! let rover = RoverBuilder::new().host("192.168.1.42").connect()?;
//! rover.on_collision(|e| println!("{} at {:.1} cm", e.kind, e.distance_cm));
//! rover.drive_for(DriveDirection::Forward, 1500, Duration::from_secs(2))?;
//! # Ok(())
//! # }
//! ```

pub use rover_client as client;
pub use rover_driver as driver;
pub use rover_protocol as protocol;

pub mod prelude;

pub use client::{
    ClientError, DriveDirection, ExploreConfig, ExploreReport, LookDirection, Result, Rover,
    RoverBuilder, RoverConfig, Waypoint,
};
pub use driver::{
    CollisionEvent, CollisionKind, ConnectionState, DriverError, Frame, SensorSnapshot,
};
pub use protocol::{Command, LedMode, ProtocolError, Response};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// 初始化日志（可重复调用，只有第一次生效）
///
/// 日志级别由 `RUST_LOG` 控制，默认 `info`。
/// 依赖 `log` crate 的库输出会被转发到 tracing。
pub fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_log::LogTracer::init();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
