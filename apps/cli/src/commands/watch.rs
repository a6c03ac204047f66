//! 持续监控

use anyhow::{Context, Result};
use clap::Args;
use rover_sdk::client::CollisionReactor;
use rover_sdk::Rover;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::warn;

#[derive(Args, Debug)]
pub struct WatchCommand {
    /// 测距请求间隔（毫秒）
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// 碰撞时在小车上播放音效
    #[arg(long)]
    pub collision_audio: bool,
}

impl WatchCommand {
    pub fn execute(&self, rover: &Rover) -> Result<()> {
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;

        let reactor = self.collision_audio.then(|| CollisionReactor::new(rover.audio()));
        rover.on_collision(move |e| {
            println!(
                "!! {} collision: {:.1} cm -> {:.1} cm",
                e.kind, e.previous_cm, e.distance_cm
            );
            if let Some(reactor) = &reactor {
                reactor.react(e);
            }
        });
        rover.on_sensor_update(|s| {
            println!(
                "#{:<5} distance {:>6.1} cm  battery {:>5.2} V",
                s.sequence, s.distance_cm, s.battery_v
            );
        });

        println!("Watching (Ctrl-C to stop)...");
        let interval = Duration::from_millis(self.interval_ms.max(20));
        while running.load(Ordering::SeqCst) {
            if !rover.is_connected() {
                warn!("Connection lost ({})", rover.state());
                break;
            }
            rover.request_distance()?;
            thread::sleep(interval);
        }

        rover.clear_callbacks();
        Ok(())
    }
}
