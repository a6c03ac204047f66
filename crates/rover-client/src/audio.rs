//! 音频协作接口与碰撞音效
//!
//! 音频在小车端播放（`CMD_AUDIO#<clip>`），客户端只负责选择片段。

use crate::error::Result;
use crate::rover::Rover;
use rand::seq::SliceRandom;
use rover_driver::{CollisionEvent, CollisionKind, RoverContext};
use rover_protocol::Command;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 音频输出
pub trait AudioSink: Send + Sync {
    /// 开始播放（不等待播放结束）
    fn play(&self, clip: &str) -> Result<()>;

    /// 播放并阻塞到预计结束
    fn play_blocking(&self, clip: &str, duration: Duration) -> Result<()> {
        self.play(clip)?;
        spin_sleep::sleep(duration);
        Ok(())
    }
}

impl AudioSink for Rover {
    fn play(&self, clip: &str) -> Result<()> {
        self.play_audio(clip)
    }
}

/// 通过共享上下文发送音频指令
///
/// 与 `Rover` 不同，它可以被移动进回调中，在接收线程里使用。
#[derive(Clone)]
pub struct RemoteAudio {
    ctx: Arc<RoverContext>,
}

impl RemoteAudio {
    pub fn new(ctx: Arc<RoverContext>) -> Self {
        Self { ctx }
    }
}

impl AudioSink for RemoteAudio {
    fn play(&self, clip: &str) -> Result<()> {
        Ok(self.ctx.send(&Command::Audio(clip.to_string()))?)
    }
}

impl Rover {
    /// 可在回调中使用的音频输出
    pub fn audio(&self) -> RemoteAudio {
        RemoteAudio::new(self.context().clone())
    }
}

/// 音效类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipCategory {
    Impact,
    CloseCall,
    Stuck,
}

impl From<CollisionKind> for ClipCategory {
    fn from(kind: CollisionKind) -> Self {
        match kind {
            CollisionKind::Impact => ClipCategory::Impact,
            CollisionKind::Proximity => ClipCategory::CloseCall,
            CollisionKind::Stuck => ClipCategory::Stuck,
        }
    }
}

/// 碰撞音效
///
/// 按事件类型从对应类别中随机挑选一个片段播放。
///
/// # 示例
///
/// ```rust,no_run
/// use rover_client::{CollisionReactor, RoverBuilder};
///
/// # fn main() -> rover_client::Result<()> {
/// let rover = RoverBuilder::new().connect()?;
/// let reactor = CollisionReactor::new(rover.audio());
/// rover.on_collision(move |event| {
///     reactor.react(event);
/// });
/// # Ok(())
/// # }
/// ```
pub struct CollisionReactor {
    sink: Box<dyn AudioSink>,
    clips: HashMap<ClipCategory, Vec<String>>,
}

impl CollisionReactor {
    /// 使用默认片段表
    pub fn new(sink: impl AudioSink + 'static) -> Self {
        Self::with_clips(sink, default_clips())
    }

    pub fn with_clips(
        sink: impl AudioSink + 'static,
        clips: HashMap<ClipCategory, Vec<String>>,
    ) -> Self {
        Self {
            sink: Box::new(sink),
            clips,
        }
    }

    /// 该类别下的片段
    pub fn clips(&self, category: ClipCategory) -> &[String] {
        self.clips.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 对碰撞事件做出反应，返回播放的片段
    pub fn react(&self, event: &CollisionEvent) -> Option<String> {
        let category = ClipCategory::from(event.kind);
        let clip = self.clips(category).choose(&mut rand::thread_rng())?.clone();
        debug!("Collision {} -> {}", event.kind, clip);
        if let Err(e) = self.sink.play(&clip) {
            warn!("Failed to play collision clip {}: {}", clip, e);
        }
        Some(clip)
    }
}

/// 默认片段表
pub fn default_clips() -> HashMap<ClipCategory, Vec<String>> {
    let table: [(ClipCategory, &[&str]); 3] = [
        (
            ClipCategory::Impact,
            &["ow_1.wav", "ow_2.wav", "ow_3.wav", "dammit.wav", "wilhelm.wav"],
        ),
        (ClipCategory::CloseCall, &["whoa.wav"]),
        (
            ClipCategory::Stuck,
            &["stuck.wav", "meant_to_do_that.wav", "why.wav"],
        ),
    ];
    table
        .into_iter()
        .map(|(category, clips)| (category, clips.iter().map(|c| c.to_string()).collect()))
        .collect()
}
