use chip8_driver::config::DriverConfig;
use chip8_driver::input::Keymap;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chip8-driver",
    about = "Drive an external CHIP-8 machine in the terminal",
    version
)]
pub struct Cli {
    /// Program to load into the machine
    pub rom: Option<PathBuf>,

    /// TOML config file; flags below override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Logical tick duration in milliseconds
    #[arg(short = 'p', long)]
    pub period_ms: Option<f64>,

    /// Side of the square painted per pixel
    #[arg(short = 's', long)]
    pub scale: Option<u16>,

    /// Cap on ticks issued in a single frame
    #[arg(long)]
    pub max_ticks_per_frame: Option<u64>,

    /// How key labels become machine codes
    #[arg(short = 'k', long, value_enum)]
    pub keymap: Option<KeymapArg>,

    /// Only rewrite the register readout when it changed
    #[arg(long)]
    pub hud_change_detection: bool,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    pub frame_limit: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KeymapArg {
    Passthrough,
    Conventional,
}

impl Cli {
    /// fold the flags into a config loaded from file (or the defaults)
    pub fn apply(&self, config: &mut DriverConfig) {
        if let Some(p) = self.period_ms {
            config.period_ms = p;
        }
        if let Some(s) = self.scale {
            config.scale = s;
        }
        if self.max_ticks_per_frame.is_some() {
            config.max_ticks_per_frame = self.max_ticks_per_frame;
        }
        if let Some(k) = self.keymap {
            config.keymap = match k {
                KeymapArg::Passthrough => Keymap::Passthrough,
                KeymapArg::Conventional => Keymap::Conventional,
            };
        }
        if self.hud_change_detection {
            config.hud_change_detection = true;
        }
        if self.frame_limit.is_some() {
            config.frame_limit = self.frame_limit;
        }
    }
}
