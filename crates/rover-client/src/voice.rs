//! 语音指令执行
//!
//! 语音管线（录音 → 转写 → 意图）不在本 crate 内，
//! 它产出结构化回复，由 [`Rover::execute_reply`] 逐条执行：
//!
//! ```json
//! {
//!   "text": "Party mode!",
//!   "commands": [
//!     {"type": "drive", "direction": "spin", "speed": 2000, "duration": 1},
//!     {"type": "audio", "clip": "party"},
//!     {"type": "led", "mode": "rainbow"}
//!   ]
//! }
//! ```

use crate::error::{ClientError, Result};
use crate::rover::Rover;
use crate::types::{DEFAULT_SPEED, DriveDirection};
use rover_protocol::LedMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// 语音管线的回复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceReply {
    /// 给用户的文字回复
    #[serde(default)]
    pub text: String,
    /// 按顺序执行的指令
    #[serde(default)]
    pub commands: Vec<VoiceCommand>,
}

impl VoiceReply {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

fn default_speed() -> i32 {
    DEFAULT_SPEED
}

/// 结构化指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VoiceCommand {
    /// 行驶；`duration` 为秒，0 表示不自动停止
    Drive {
        direction: String,
        #[serde(default = "default_speed")]
        speed: i32,
        #[serde(default)]
        duration: f64,
    },
    /// 播放音频片段
    Audio { clip: String },
    /// LED 灯效
    Led { mode: String },
    /// 行为模式（需要自主行为模块，核心客户端不支持）
    Mode { mode: String },
    /// 未知类型
    #[serde(other)]
    Unknown,
}

/// 语音转写接口
///
/// 输入录音字节，输出结构化回复。实现可以是本地模型或远程服务。
pub trait VoiceTranscriber: Send + Sync {
    fn transcribe(&self, audio: &[u8]) -> Result<VoiceReply>;
}

impl Rover {
    /// 执行一条结构化指令
    ///
    /// # 错误
    /// - `ClientError::Unsupported`: 未知方向、灯效或模式
    /// - 其他错误来自发送
    pub fn execute(&self, command: &VoiceCommand) -> Result<()> {
        match command {
            VoiceCommand::Drive {
                direction,
                speed,
                duration,
            } => {
                let direction: DriveDirection =
                    direction.parse().map_err(ClientError::Unsupported)?;
                let duration = Duration::try_from_secs_f64(*duration).unwrap_or(Duration::ZERO);
                self.drive_for(direction, *speed, duration)
            },
            VoiceCommand::Audio { clip } => self.play_audio(clip),
            VoiceCommand::Led { mode } => match mode.to_ascii_lowercase().as_str() {
                "off" => self.led_off(),
                "rainbow" | "party" => self.led_rainbow(),
                "blink" => self.led_mode(LedMode::Blink),
                "breathe" => self.led_mode(LedMode::Breathe),
                "following" => self.led_mode(LedMode::Following),
                "happy" => self.set_led(0, 0, 255, 0),
                other => Err(ClientError::Unsupported(format!("led mode {}", other))),
            },
            VoiceCommand::Mode { mode } => {
                Err(ClientError::Unsupported(format!("behaviour mode {}", mode)))
            },
            VoiceCommand::Unknown => Err(ClientError::Unsupported("unknown command type".into())),
        }
    }

    /// 按顺序执行所有指令，返回成功执行的条数
    ///
    /// 不支持的指令被记录并跳过；发送失败立即返回。
    pub fn execute_all(&self, commands: &[VoiceCommand]) -> Result<usize> {
        let mut executed = 0;
        for command in commands {
            match self.execute(command) {
                Ok(()) => executed += 1,
                Err(ClientError::Unsupported(what)) => warn!("Skipping voice command: {}", what),
                Err(e) => return Err(e),
            }
        }
        Ok(executed)
    }

    /// 执行一条语音回复
    pub fn execute_reply(&self, reply: &VoiceReply) -> Result<usize> {
        if !reply.text.is_empty() {
            info!("Voice reply: {}", reply.text);
        }
        self.execute_all(&reply.commands)
    }
}
