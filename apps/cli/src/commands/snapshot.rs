//! 摄像头截图

use anyhow::{Result, bail};
use clap::Args;
use rover_sdk::Rover;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Args, Debug)]
pub struct SnapshotCommand {
    /// 输出文件
    #[arg(default_value = "rover_frame.jpg")]
    pub path: PathBuf,

    /// 等待第一帧的时间（毫秒）
    #[arg(long, default_value_t = 3000)]
    pub wait_ms: u64,
}

impl SnapshotCommand {
    pub fn execute(&self, rover: &Rover) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(self.wait_ms);
        while rover.latest_frame().is_none() {
            if Instant::now() >= deadline {
                bail!("No video frame within {} ms", self.wait_ms);
            }
            thread::sleep(Duration::from_millis(20));
        }

        let len = rover.save_frame(&self.path)?;
        println!("Saved {} bytes to {}", len, self.path.display());
        Ok(())
    }
}
