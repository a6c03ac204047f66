//! 命令实现

mod drive;
mod explore;
mod led;
mod patrol;
mod snapshot;
mod status;
mod voice;
mod watch;

pub use drive::DriveCommand;
pub use explore::ExploreCommand;
pub use led::LedCommand;
pub use patrol::PatrolCommand;
pub use snapshot::SnapshotCommand;
pub use status::StatusCommand;
pub use voice::VoiceReplyCommand;
pub use watch::WatchCommand;

use anyhow::{Context, Result};
use rover_sdk::{Rover, RoverConfig};

/// 连接小车
pub fn connect(config: RoverConfig) -> Result<Rover> {
    let target = format!(
        "{} (command {}, video {})",
        config.host, config.command_port, config.video_port
    );
    let mut rover = Rover::new(config);
    rover
        .connect()
        .with_context(|| format!("Failed to connect to {}", target))?;
    Ok(rover)
}
