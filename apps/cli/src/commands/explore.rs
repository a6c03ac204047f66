//! 自主探索

use anyhow::{Context, Result};
use clap::Args;
use rover_sdk::{ExploreConfig, Rover};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ExploreCommand {
    /// 探索时长（秒）
    #[arg(short = 't', long, default_value_t = 10.0)]
    pub seconds: f64,

    /// 障碍距离阈值（cm）
    #[arg(long, default_value_t = 30.0)]
    pub obstacle_cm: f64,

    /// 前进与转向速度
    #[arg(short, long, default_value_t = 1500)]
    pub speed: i32,
}

impl ExploreCommand {
    pub fn config(&self) -> ExploreConfig {
        ExploreConfig {
            obstacle_cm: self.obstacle_cm,
            cruise_speed: self.speed,
            turn_speed: self.speed,
            ..Default::default()
        }
    }

    pub fn execute(&self, rover: &Rover) -> Result<()> {
        let duration = Duration::try_from_secs_f64(self.seconds)
            .with_context(|| format!("Invalid duration: {}", self.seconds))?;
        println!("Exploring for {:.1}s...", duration.as_secs_f64());

        let report = rover.explore_with(duration, &self.config())?;
        println!(
            "Explored {} steps, {} obstacles (left turns {}, right turns {})",
            report.steps, report.obstacles, report.left_turns, report.right_turns
        );
        Ok(())
    }
}
