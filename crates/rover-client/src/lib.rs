//! 客户端接口模块
//!
//! 本模块提供小车的用户友好接口，包括：
//! - `Rover` 门面（连接生命周期、运动、云台、灯光、声音、传感器、视频）
//! - `RoverBuilder` 与 TOML 配置
//! - 组合动作（自主探索、巡逻）
//! - 语音指令执行（结构化指令 → 小车动作）
//! - 碰撞音效反应
//!
//! # 使用场景
//!
//! 这是大多数用户应该使用的模块。
//! 如果需要直接控制通道和接收线程，可以使用 `rover-driver`。
//!
//! # 传感器读取是异步的
//!
//! `request_*` 只负责发送请求，读数由接收线程写入传感器快照。
//! 协议中没有请求/响应关联，需要等待时请使用 [`Rover::wait_for_update`]。

pub mod audio;
pub mod behavior;
pub mod builder;
pub mod config;
mod error;
mod rover;
pub mod types;
pub mod voice;

#[cfg(test)]
mod test_util;

pub use audio::{AudioSink, ClipCategory, CollisionReactor, RemoteAudio};
pub use behavior::{ExploreConfig, ExploreReport, Waypoint, default_patrol_route};
pub use builder::RoverBuilder;
pub use config::{CollisionSettings, RoverConfig, VideoSettings};
pub use error::{ClientError, Result};
pub use rover::Rover;
pub use types::*;
pub use voice::{VoiceCommand, VoiceReply, VoiceTranscriber};
