//! 巡逻

use anyhow::Result;
use clap::Args;
use rover_sdk::client::default_patrol_route;
use rover_sdk::{DriveDirection, Rover, Waypoint};
use std::time::Duration;

#[derive(Args, Debug)]
pub struct PatrolCommand {
    /// 航点 `方向:秒`，例如 `forward:1.5 turn-right:0.4`（缺省时绕方形）
    #[arg(value_parser = parse_waypoint)]
    pub waypoints: Vec<Waypoint>,

    /// 行驶速度
    #[arg(short, long, default_value_t = 2000)]
    pub speed: i32,
}

/// 解析 `方向:秒`
fn parse_waypoint(s: &str) -> Result<Waypoint, String> {
    let (direction, seconds) = s
        .split_once(':')
        .ok_or_else(|| format!("expected DIRECTION:SECONDS, got {:?}", s))?;
    let direction: DriveDirection = direction.parse()?;
    let seconds: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| format!("invalid seconds: {:?}", seconds))?;
    let duration = Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("invalid seconds: {:?}", seconds))?;
    Ok((direction, duration))
}

impl PatrolCommand {
    pub fn route(&self) -> Vec<Waypoint> {
        if self.waypoints.is_empty() {
            default_patrol_route()
        } else {
            self.waypoints.clone()
        }
    }

    pub fn execute(&self, rover: &Rover) -> Result<()> {
        let route = self.route();
        println!("Patrolling {} waypoints at {}", route.len(), self.speed);
        rover.patrol_at(&route, self.speed)?;
        println!("Patrol complete");
        Ok(())
    }
}
