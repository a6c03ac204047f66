//! 执行语音回复

use anyhow::{Context, Result};
use clap::Args;
use rover_sdk::Rover;
use rover_sdk::client::VoiceReply;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct VoiceReplyCommand {
    /// JSON 文件：`{"text": ..., "commands": [...]}`
    pub file: PathBuf,
}

impl VoiceReplyCommand {
    pub fn execute(&self, rover: &Rover) -> Result<()> {
        let json = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let reply = VoiceReply::from_json(&json)?;

        if !reply.text.is_empty() {
            println!("\"{}\"", reply.text);
        }
        let executed = rover.execute_reply(&reply)?;
        println!("Executed {}/{} commands", executed, reply.commands.len());
        Ok(())
    }
}
