//! 定时行驶

use anyhow::{Context, Result};
use clap::Args;
use rover_sdk::{DriveDirection, Rover};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct DriveCommand {
    /// 方向（forward/backward/left/right/strafe-left/strafe-right/spin/stop）
    pub direction: DriveDirection,

    /// 速度（0-4095，超出部分会被限幅）
    #[arg(short, long, default_value_t = 2000)]
    pub speed: i32,

    /// 行驶时长（秒），0 表示不自动停止
    #[arg(short = 't', long, default_value_t = 1.0)]
    pub seconds: f64,
}

impl DriveCommand {
    pub fn execute(&self, rover: &Rover) -> Result<()> {
        let duration = Duration::try_from_secs_f64(self.seconds)
            .with_context(|| format!("Invalid duration: {}", self.seconds))?;
        println!(
            "Driving {} at {} for {:.1}s",
            self.direction,
            self.speed,
            duration.as_secs_f64()
        );
        rover.drive_for(self.direction, self.speed, duration)?;
        Ok(())
    }
}
