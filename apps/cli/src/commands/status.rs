//! 传感器状态

use anyhow::Result;
use clap::Args;
use rover_sdk::driver::SensorChannel;
use rover_sdk::{Rover, SensorSnapshot};
use std::time::{Duration, Instant};

const ALL_CHANNELS: [SensorChannel; 4] = [
    SensorChannel::Distance,
    SensorChannel::Battery,
    SensorChannel::Light,
    SensorChannel::Line,
];

#[derive(Args, Debug)]
pub struct StatusCommand {
    /// 等待读数的时间（毫秒）
    #[arg(long, default_value_t = 1000)]
    pub wait_ms: u64,
}

impl StatusCommand {
    pub fn execute(&self, rover: &Rover) -> Result<()> {
        rover.request_all()?;

        let deadline = Instant::now() + Duration::from_millis(self.wait_ms);
        let mut snapshot = rover.sensors();
        while !ALL_CHANNELS.iter().all(|&c| snapshot.has(c)) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rover.wait_for_update(snapshot.sequence, remaining) {
                Some(next) => snapshot = next,
                None => break,
            }
        }

        print!("{}", render(&snapshot));
        let m = rover.metrics();
        println!(
            "link:     {} lines ({} malformed), {} frames",
            m.lines_received, m.lines_malformed, m.frames_received
        );
        Ok(())
    }
}

fn field(snapshot: &SensorSnapshot, channel: SensorChannel, text: String) -> String {
    if snapshot.has(channel) {
        text
    } else {
        "n/a".to_string()
    }
}

fn render(s: &SensorSnapshot) -> String {
    format!(
        "distance: {}\nbattery:  {}\nlight:    {}\nline:     {}\n",
        field(s, SensorChannel::Distance, format!("{:.1} cm", s.distance_cm)),
        field(s, SensorChannel::Battery, format!("{:.2} V", s.battery_v)),
        field(
            s,
            SensorChannel::Light,
            format!("L {:.0} / R {:.0}", s.light_left, s.light_right)
        ),
        field(
            s,
            SensorChannel::Line,
            format!("{:.0} {:.0} {:.0}", s.ir_left, s.ir_center, s.ir_right)
        ),
    )
}
