//! # Rover CLI
//!
//! 小车远程控制命令行工具。每条命令独立完成"连接 → 操作 → 断开"。
//!
//! ```bash
//! rover-cli --host 192.168.1.42 status
//! rover-cli drive forward --speed 1500 --seconds 2
//! rover-cli explore --seconds 30
//! rover-cli patrol forward:1.5 turn-right:0.4 forward:1.5
//! rover-cli look left
//! rover-cli led --mode rainbow
//! rover-cli snapshot frame.jpg
//! rover-cli voice reply.json
//! rover-cli watch --collision-audio
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{
    DriveCommand, ExploreCommand, LedCommand, PatrolCommand, SnapshotCommand, StatusCommand,
    VoiceReplyCommand, WatchCommand,
};
use rover_sdk::LookDirection;

/// Rover CLI - 小车命令行工具
#[derive(Parser, Debug)]
#[command(name = "rover-cli")]
#[command(about = "Command-line interface for rover remote control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认: ~/.config/rover/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 控制器地址（覆盖配置）
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 读取所有传感器
    Status {
        #[command(flatten)]
        args: StatusCommand,
    },

    /// 按方向行驶一段时间
    Drive {
        #[command(flatten)]
        args: DriveCommand,
    },

    /// 自主探索：前进并避开障碍
    Explore {
        #[command(flatten)]
        args: ExploreCommand,
    },

    /// 按航点巡逻
    Patrol {
        #[command(flatten)]
        args: PatrolCommand,
    },

    /// 云台转到预设方向（left/right/center/up/down）
    Look { direction: LookDirection },

    /// 设置 LED
    Led {
        #[command(flatten)]
        args: LedCommand,
    },

    /// 蜂鸣
    Beep {
        /// 时长（毫秒）
        #[arg(long, default_value_t = 100)]
        ms: u64,
    },

    /// 在小车上播放音频文件
    Play { clip: String },

    /// 保存一帧摄像头画面
    Snapshot {
        #[command(flatten)]
        args: SnapshotCommand,
    },

    /// 执行语音管线的 JSON 回复
    Voice {
        #[command(flatten)]
        args: VoiceReplyCommand,
    },

    /// 持续打印传感器与碰撞事件（Ctrl-C 退出）
    Watch {
        #[command(flatten)]
        args: WatchCommand,
    },
}

fn main() -> Result<()> {
    rover_sdk::init_logger();

    let cli = Cli::parse();
    let config = config::resolve(cli.config.as_deref(), cli.host.as_deref())?;
    let mut rover = commands::connect(config)?;

    let result = match cli.command {
        Commands::Status { args } => args.execute(&rover),
        Commands::Drive { args } => args.execute(&rover),
        Commands::Explore { args } => args.execute(&rover),
        Commands::Patrol { args } => args.execute(&rover),
        Commands::Look { direction } => {
            rover.look(direction)?;
            println!("Looking {:?}", direction);
            Ok(())
        },
        Commands::Led { args } => args.execute(&rover),
        Commands::Beep { ms } => {
            rover.beep(std::time::Duration::from_millis(ms))?;
            Ok(())
        },
        Commands::Play { clip } => {
            rover.play_audio(&clip)?;
            println!("Playing {}", clip);
            Ok(())
        },
        Commands::Snapshot { args } => args.execute(&rover),
        Commands::Voice { args } => args.execute(&rover),
        Commands::Watch { args } => args.execute(&rover),
    };

    rover.disconnect();
    result
}
