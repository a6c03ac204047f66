//! LED 控制

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use rover_sdk::{LedMode, Rover};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedModeArg {
    Off,
    Manual,
    Following,
    Blink,
    Breathe,
    Rainbow,
}

impl From<LedModeArg> for LedMode {
    fn from(arg: LedModeArg) -> Self {
        match arg {
            LedModeArg::Off => LedMode::Off,
            LedModeArg::Manual => LedMode::Manual,
            LedModeArg::Following => LedMode::Following,
            LedModeArg::Blink => LedMode::Blink,
            LedModeArg::Breathe => LedMode::Breathe,
            LedModeArg::Rainbow => LedMode::Rainbow,
        }
    }
}

#[derive(Args, Debug)]
pub struct LedCommand {
    /// 灯效模式
    #[arg(short, long, value_enum, conflicts_with = "rgb")]
    pub mode: Option<LedModeArg>,

    /// 颜色（0-255）
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"])]
    pub rgb: Option<Vec<u8>>,

    /// LED 序号（0 表示全部）
    #[arg(short, long, default_value_t = 0)]
    pub index: u8,
}

impl LedCommand {
    pub fn execute(&self, rover: &Rover) -> Result<()> {
        match (&self.mode, &self.rgb) {
            (Some(mode), _) => {
                rover.led_mode((*mode).into())?;
                println!("LED mode: {:?}", mode);
            },
            (None, Some(rgb)) => {
                let [r, g, b] = rgb[..] else {
                    bail!("--rgb takes exactly three values");
                };
                rover.set_led(self.index, r, g, b)?;
                println!("LED {} set to ({}, {}, {})", self.index, r, g, b);
            },
            (None, None) => bail!("Specify --mode or --rgb"),
        }
        Ok(())
    }
}
